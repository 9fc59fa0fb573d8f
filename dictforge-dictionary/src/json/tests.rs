use assert_matches::assert_matches;

use super::*;

const ORDERS_JSON: &str = r#"{
  "name": "orders",
  "description": "Order flow",
  "attributes": { "version": { "value": 2, "type": "INTEGER" }, "vendor": "acme" },
  "fields": {
    "Qty": { "id": "1", "type": "INTEGER", "required": true, "defaultValue": 1 },
    "Side": { "type": "CHAR", "values": { "Buy": "1", "Sell": "2" } }
  },
  "messages": {
    "Order": {
      "id": "10",
      "attributes": { "category": "app" },
      "fields": {
        "Qty": { "reference": "Qty", "required": true },
        "Legs": {
          "collection": true,
          "fields": { "LegSide": { "reference": "Side" } }
        }
      }
    },
    "Cancel": { "reference": "Order" }
  }
}"#;

const ORDERS_YAML: &str = r#"
name: orders
description: Order flow
attributes:
  version: { value: 2, type: INTEGER }
  vendor: acme
fields:
  Qty: { id: "1", type: INTEGER, required: true, defaultValue: 1 }
  Side:
    type: CHAR
    values:
      Buy: "1"
      Sell: "2"
messages:
  Order:
    id: "10"
    attributes: { category: app }
    fields:
      Qty: { reference: Qty, required: true }
      Legs:
        collection: true
        fields:
          LegSide: { reference: Side }
  Cancel: { reference: Order }
"#;

fn check_orders(raw: &RawDictionary) {
    assert_eq!(raw.name, "orders");
    assert_eq!(raw.description.as_deref(), Some("Order flow"));
    assert_eq!(
        raw.attributes,
        [
            RawAttribute::typed("version", "2", ScalarType::Integer),
            RawAttribute::new("vendor", "acme"),
        ]
    );

    let qty = &raw.fields[0];
    assert_eq!(qty.id.as_deref(), Some("1"));
    assert_eq!(qty.default_value.as_deref(), Some("1"));
    assert!(qty.required);

    let side = &raw.fields[1];
    assert_eq!(side.id.as_deref(), Some("Side"));
    assert_eq!(
        side.values,
        [RawAttribute::new("Buy", "1"), RawAttribute::new("Sell", "2")]
    );

    let order = &raw.messages[0];
    assert_eq!(order.id.as_deref(), Some("10"));
    assert_eq!(order.attributes, [RawAttribute::new("category", "app")]);
    let members: Vec<_> = order.fields().iter().map(RawField::display_name).collect();
    assert_eq!(members, ["Qty", "Legs"]);
    assert_eq!(order.fields()[0].reference.as_deref(), Some("1"));
    assert_eq!(order.fields()[0].id, None);

    let legs = &order.fields()[1];
    assert!(legs.is_message());
    assert!(legs.collection);
    assert_eq!(legs.fields()[0].reference.as_deref(), Some("Side"));

    let cancel = &raw.messages[1];
    assert!(cancel.is_message());
    assert!(cancel.fields().is_empty());
    assert_eq!(cancel.reference.as_deref(), Some("10"));
}

#[test]
fn parse_json_dictionary() {
    check_orders(&read_json_dictionary(ORDERS_JSON).unwrap());
}

#[test]
fn parse_yaml_dictionary() {
    check_orders(&read_yaml_dictionary(ORDERS_YAML).unwrap());
}

#[test]
fn messages_win_over_fields_by_name() {
    let raw = read_yaml_dictionary(
        r#"
name: d
fields:
  Header: { id: header.field, type: STRING }
messages:
  Header: { id: header.message }
  Order:
    fields:
      Hdr: { reference: Header }
"#,
    )
    .unwrap();

    assert_eq!(
        raw.messages[1].fields()[0].reference.as_deref(),
        Some("header.message")
    );
}

#[test]
fn unknown_reference_name() {
    assert_matches!(
        read_json_dictionary(r#"{ "name": "d", "fields": { "A": { "reference": "Missing" } } }"#),
        Err(Error::Reference(ReferenceError::UnknownReference { owner, reference }))
            if owner == "A" && reference == "Missing"
    );
}

#[test]
fn unknown_property() {
    assert_matches!(
        read_json_dictionary(r#"{ "name": "d", "fields": { "A": { "kind": "INTEGER" } } }"#),
        Err(Error::JsonParse(_))
    );
}

#[test]
fn malformed_yaml() {
    assert_matches!(
        read_yaml_dictionary("name: [d"),
        Err(Error::YamlParse(_))
    );
}
