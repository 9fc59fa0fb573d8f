use assert_matches::assert_matches;

use super::*;
use crate::raw::RawKind;

const ORDERS: &str = r#"
<?xml version='1.0' encoding='UTF-8'?>
<dictionary name='orders'>
  <description>Order flow</description>
  <attribute name='version' type='INTEGER'>2</attribute>
  <fields>
    <field id='qty' name='Qty' type='INTEGER' isRequired='true' defaultvalue='1'>
      <description>Quantity</description>
      <attribute name='tag'>38</attribute>
    </field>
    <field id='side' name='Side' type='CHAR'>
      <value name='Buy'>1</value>
      <value name='Sell'>2</value>
    </field>
  </fields>
  <messages>
    <message id='order' name='Order'>
      <description>New order</description>
      <attribute name='category'>app</attribute>
      <field id='order.qty' name='Qty' reference='qty'/>
      <message id='order.legs' name='Legs' isCollection='Y'>
        <field id='leg.side' name='LegSide' reference='side' isRequired='N'/>
      </message>
      <field id='order.side' name='Side' reference='side' isRequired='Y'/>
    </message>
    <message id='cancel' name='Cancel' reference='order'/>
  </messages>
</dictionary>
"#;

#[test]
fn parse_dictionary_header() {
    let raw = read_dictionary(ORDERS).unwrap();

    assert_eq!(raw.name, "orders");
    assert_eq!(raw.description.as_deref(), Some("Order flow"));
    assert_eq!(
        raw.attributes,
        [RawAttribute::typed("version", "2", ScalarType::Integer)]
    );
}

#[test]
fn parse_fields() {
    let raw = read_dictionary(ORDERS).unwrap();

    assert_eq!(raw.fields.len(), 2);
    let qty = &raw.fields[0];
    assert_eq!(qty.id.as_deref(), Some("qty"));
    assert_eq!(qty.scalar_type, Some(ScalarType::Integer));
    assert_eq!(qty.default_value.as_deref(), Some("1"));
    assert_eq!(qty.description.as_deref(), Some("Quantity"));
    assert!(qty.required);
    assert!(!qty.is_message());
    assert_eq!(qty.attributes, [RawAttribute::new("tag", "38")]);

    let side = &raw.fields[1];
    assert_eq!(side.scalar_type, Some(ScalarType::Char));
    assert_eq!(
        side.values,
        [RawAttribute::new("Buy", "1"), RawAttribute::new("Sell", "2")]
    );
}

#[test]
fn parse_messages_keep_member_order() {
    let raw = read_dictionary(ORDERS).unwrap();

    let order = &raw.messages[0];
    assert!(order.is_message());
    assert_eq!(order.description.as_deref(), Some("New order"));
    assert_eq!(order.attributes, [RawAttribute::new("category", "app")]);

    let members: Vec<_> = order.fields().iter().map(RawField::display_name).collect();
    assert_eq!(members, ["Qty", "Legs", "Side"]);

    let legs = &order.fields()[1];
    assert!(legs.is_message());
    assert!(legs.collection);
    assert!(!legs.fields()[0].required);
    assert!(order.fields()[2].required);
}

#[test]
fn parse_empty_message() {
    let raw = read_dictionary(ORDERS).unwrap();

    let cancel = &raw.messages[1];
    assert_eq!(cancel.reference.as_deref(), Some("order"));
    assert_matches!(&cancel.kind, RawKind::Message { fields } if fields.is_empty());
}

#[test]
fn parse_type_aliases() {
    let raw = read_dictionary(
        "<dictionary name='d'><fields>\
           <field name='A' type='INT'/>\
           <field name='B' type='DATE_TIME'/>\
           <field name='C' type='CHARACTER'/>\
         </fields></dictionary>",
    )
    .unwrap();

    let types: Vec<_> = raw.fields.iter().map(|field| field.scalar_type).collect();
    assert_eq!(
        types,
        [
            Some(ScalarType::Integer),
            Some(ScalarType::DateTime),
            Some(ScalarType::Char)
        ]
    );
}

#[test]
fn parse_unknown_type() {
    assert_matches!(
        read_dictionary("<dictionary name='d'><fields><field name='A' type='MONEY'/></fields></dictionary>"),
        Err(Error::XmlParse(_))
    );
}

#[test]
fn parse_invalid_flag() {
    assert_matches!(
        read_dictionary("<dictionary name='d'><fields><field name='A' type='INTEGER' isRequired='maybe'/></fields></dictionary>"),
        Err(Error::XmlParse(_))
    );
}

#[test]
fn parse_malformed_document() {
    assert_matches!(read_dictionary("<dictionary name='d'><fields>"), Err(Error::XmlParse(_)));
}
