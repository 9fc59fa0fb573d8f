use std::{
    env, fs,
    path::{Path, PathBuf},
};

use assert_matches::assert_matches;
use dictforge_core::{ScalarType, Value};
use uuid::Uuid;

use super::*;
use crate::{
    ReferenceError,
    raw::{RawAttribute, RawField},
    structure::MessageStructure,
};

const ORDERS_XML: &str = r#"
<dictionary name='orders'>
  <fields>
    <field id='1' name='Qty' type='INT' isRequired='Y'/>
  </fields>
  <messages>
    <message id='10' name='Order'>
      <field id='10.1' name='Qty' reference='1' isRequired='Y'/>
    </message>
  </messages>
</dictionary>
"#;

const ORDERS_JSON: &str = r#"
{
  "name": "orders",
  "fields": {
    "Qty": { "id": "1", "type": "INT", "required": true }
  },
  "messages": {
    "Order": {
      "id": "10",
      "fields": { "Qty": { "reference": "Qty", "required": true } }
    }
  }
}
"#;

const ORDERS_YAML: &str = r#"
name: orders
fields:
  Qty: { id: "1", type: INT, required: true }
messages:
  Order:
    id: "10"
    fields:
      Qty: { reference: Qty, required: true }
"#;

const ORDERS_XSD: &str = r#"
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="orders">
  <xs:element name="Qty" type="xs:int"/>
  <xs:complexType name="Order">
    <xs:sequence><xs:element ref="Qty"/></xs:sequence>
  </xs:complexType>
</xs:schema>
"#;

fn orders() -> RawDictionary {
    RawDictionary::new("orders")
        .with_field(
            RawField::field("1", "Qty")
                .with_type(ScalarType::Integer)
                .with_required(true),
        )
        .with_message(
            RawField::message("10", "Order").with_field(
                RawField::field("10.1", "Qty")
                    .with_reference("1")
                    .with_required(true),
            ),
        )
}

fn field_names(message: &MessageStructure) -> Vec<&str> {
    message.fields().keys().map(String::as_str).collect()
}

fn check_orders(dictionary: &DictionaryStructure) {
    assert_eq!(dictionary.namespace(), "orders");
    let qty = dictionary.field("Qty").unwrap();
    assert_eq!(qty.scalar_type(), Some(ScalarType::Integer));

    let order = dictionary.message("Order").unwrap();
    assert_eq!(order.namespace(), "orders");
    let order_qty = order.field("Qty").unwrap();
    assert_eq!(order_qty.scalar_type(), Some(ScalarType::Integer));
    assert!(order_qty.is_required());
}

struct TestFile {
    test_dir: PathBuf,
    path: PathBuf,
}

impl TestFile {
    fn new(file_name: &str, data: &str) -> TestFile {
        let test_dir = env::temp_dir().join(Uuid::new_v4().hyphenated().to_string());
        fs::create_dir(test_dir.as_path()).unwrap_or_else(|err| {
            panic!(
                "Failed to create temporary directory {}: {err}",
                test_dir.display()
            )
        });
        let path = test_dir.join(file_name);
        fs::write(&path, data).unwrap_or_else(|err| {
            panic!("Failed to write temporary file {}: {err}", path.display())
        });
        TestFile { test_dir, path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        if self.test_dir.exists() {
            if self.path.exists() {
                if let Err(err) = fs::remove_file(&self.path) {
                    eprintln!(
                        "Warning: Failed to clean up temporary file {}: {err}",
                        self.path.display(),
                    );
                }
            }
            if let Err(err) = fs::remove_dir(&self.test_dir) {
                eprintln!(
                    "Warning: Failed to clean up temporary directory {}: {err}",
                    self.test_dir.display(),
                );
            }
        }
    }
}

// Assembly

#[test]
fn test_end_to_end() {
    let dictionary = DictionaryLoader::new().convert(&orders()).unwrap();

    check_orders(&dictionary);
    assert!(dictionary.field("Qty").unwrap().is_required());
    assert_eq!(dictionary.messages().len(), 1);
}

#[test]
fn test_conversion_is_idempotent() {
    let raw = orders();

    let first = DictionaryLoader::new().convert(&raw).unwrap();
    let second = DictionaryLoader::new().convert(&raw).unwrap();
    assert_eq!(first, second);

    let loader = DictionaryLoader::new();
    assert_eq!(loader.convert(&raw).unwrap(), loader.convert(&raw).unwrap());
}

#[test]
fn test_dictionary_attributes_last_wins() {
    let raw = orders()
        .with_attribute(RawAttribute::typed("version", "1", ScalarType::Integer))
        .with_attribute(RawAttribute::new("vendor", "acme"))
        .with_attribute(RawAttribute::typed("version", "2", ScalarType::Integer));
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    let names: Vec<_> = dictionary.attributes().keys().map(String::as_str).collect();
    assert_eq!(names, ["vendor", "version"]);
    assert_eq!(
        dictionary.attribute("version").unwrap().cast_value(),
        Some(&Value::Integer(2))
    );
}

#[test]
fn test_child_attribute_overrides_parent() {
    let raw = RawDictionary::new("test")
        .with_field(
            RawField::field("base", "Base")
                .with_type(ScalarType::String)
                .with_attribute(RawAttribute::new("A", "1")),
        )
        .with_message(
            RawField::message("m", "M").with_field(
                RawField::field("m.f", "F")
                    .with_reference("base")
                    .with_attribute(RawAttribute::new("A", "2")),
            ),
        );
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    let field = dictionary.message("M").unwrap().field("F").unwrap();
    assert_eq!(field.attributes().len(), 1);
    assert_eq!(field.attribute("A").unwrap().value(), Some("2"));
}

#[test]
fn test_top_level_field_type_walk() {
    let raw = RawDictionary::new("test")
        .with_field(RawField::field("a", "A").with_reference("b"))
        .with_field(RawField::field("b", "B").with_reference("c"))
        .with_field(RawField::field("c", "C").with_type(ScalarType::Integer));
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    for name in ["A", "B", "C"] {
        assert_eq!(
            dictionary.field(name).unwrap().scalar_type(),
            Some(ScalarType::Integer)
        );
    }
}

#[test]
fn test_top_level_field_type_cycle() {
    let raw = RawDictionary::new("test")
        .with_field(RawField::field("b", "B").with_reference("a"))
        .with_field(RawField::field("a", "A").with_reference("b"));

    assert_matches!(
        DictionaryLoader::new().convert(&raw),
        Err(Error::Reference(ReferenceError::RecursiveReference(ids))) if ids == ["a", "b"]
    );
}

#[test]
fn test_long_field_reference_chain() {
    let mut raw = RawDictionary::new("test");
    for i in 0..1000 {
        raw = raw.with_field(
            RawField::field(format!("f{i}"), format!("F{i}")).with_reference(format!("f{}", i + 1)),
        );
    }
    raw = raw.with_field(RawField::field("f1000", "F1000").with_type(ScalarType::Long));
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    assert_eq!(
        dictionary.field("F0").unwrap().scalar_type(),
        Some(ScalarType::Long)
    );
}

#[test]
fn test_message_in_fields() {
    let raw = RawDictionary::new("test").with_field(RawField::message("m", "M"));

    assert_matches!(
        DictionaryLoader::new().convert(&raw),
        Err(Error::Validation(ValidationError::MessageInFields(name))) if name == "M"
    );
}

#[test]
fn test_duplicated_top_level_fields() {
    let raw = RawDictionary::new("test")
        .with_field(RawField::field("p1", "Price").with_type(ScalarType::Decimal))
        .with_field(RawField::field("p2", "Price").with_type(ScalarType::Decimal));

    assert_matches!(
        DictionaryLoader::new().convert(&raw),
        Err(Error::Validation(ValidationError::DuplicatedField(name))) if name == "Price"
    );
}

#[test]
fn test_duplicated_message_names() {
    let raw = RawDictionary::new("test")
        .with_message(RawField::message("o1", "Order"))
        .with_message(RawField::message("o2", "Order"))
        .with_message(RawField::message("c", "Cancel"));

    assert_matches!(
        DictionaryLoader::new().convert(&raw),
        Err(Error::Validation(ValidationError::DuplicatedMessages(names)))
            if names == ["Order (o1, o2)"]
    );
}

#[test]
fn test_duplicated_fields_in_message() {
    let raw = RawDictionary::new("test").with_message(
        RawField::message("m", "M")
            .with_field(RawField::field("m.p1", "Price").with_type(ScalarType::Decimal))
            .with_field(RawField::field("m.p2", "Price").with_type(ScalarType::Decimal)),
    );

    let err = DictionaryLoader::new().convert(&raw).unwrap_err();
    assert_eq!(err.message_path(), ["M"]);
    assert_matches!(
        err.root_cause(),
        Error::Validation(ValidationError::DuplicatedMessageField { message, field })
            if message == "M" && field == "Price"
    );
}

#[test]
fn test_message_reference_cycle() {
    let mut raw = RawDictionary::new("test");
    for i in 0..1000 {
        raw = raw.with_message(
            RawField::message(format!("m{i}"), format!("M{i}"))
                .with_reference(format!("m{}", (i + 1) % 1000)),
        );
    }

    let err = DictionaryLoader::new().convert(&raw).unwrap_err();
    assert_matches!(
        err.root_cause(),
        Error::Reference(ReferenceError::RecursiveMessage(_))
    );
}

#[test]
fn test_forward_references_fulfilled() {
    let raw = RawDictionary::new("test")
        .with_message(
            RawField::message("a", "A")
                .with_field(RawField::field("a.qty", "Qty").with_type(ScalarType::Integer))
                .with_field(RawField::field("a.b", "B").with_reference("b")),
        )
        .with_message(
            RawField::message("b", "B")
                .with_field(RawField::field("b.qty", "Qty").with_reference("a.qty"))
                .with_field(RawField::field("b.a", "A").with_reference("a")),
        );
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    let b = dictionary.message("B").unwrap();
    assert_eq!(b.field("Qty").unwrap().scalar_type(), Some(ScalarType::Integer));
    for message in dictionary.messages().values() {
        for field in message.fields().values().filter(|field| field.is_complex()) {
            assert!(
                dictionary.message_of(field).is_some(),
                "{}.{} points to a missing message",
                message.name(),
                field.name()
            );
        }
    }
}

#[test]
fn test_message_built_by_its_own_ancestor() {
    let raw = RawDictionary::new("test")
        .with_message(RawField::message("a", "A").with_reference("p"))
        .with_message(
            RawField::message("p", "P")
                .with_field(RawField::field("p.child", "Child").with_reference("a")),
        )
        .with_message(
            RawField::message("z", "Z")
                .with_field(RawField::field("z.x", "X").with_type(ScalarType::Integer)),
        );
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    let names: Vec<_> = dictionary.messages().keys().map(String::as_str).collect();
    assert_eq!(names, ["A", "P", "Z"]);
    assert_eq!(
        dictionary.message("P").unwrap().field("Child").unwrap().reference_name(),
        Some("A")
    );
}

#[test]
fn test_all_top_level_messages_resolved_out_of_order() {
    let raw = RawDictionary::new("test")
        .with_message(
            RawField::message("a", "A").with_field(RawField::field("a.c", "C").with_reference("c")),
        )
        .with_message(RawField::message("b", "B").with_reference("c"))
        .with_message(
            RawField::message("c", "C")
                .with_field(RawField::field("c.x", "X").with_type(ScalarType::Integer)),
        )
        .with_message(RawField::message("d", "D").with_reference("b"));
    let dictionary = DictionaryLoader::new().convert(&raw).unwrap();

    assert_eq!(dictionary.messages().len(), 4);
    for name in ["A", "B", "C", "D"] {
        assert!(dictionary.message(name).is_some(), "{name} is missing");
    }
    assert_eq!(field_names(dictionary.message("D").unwrap()), ["X"]);
}

#[test]
fn test_aggregation_off_and_on() {
    let raw = RawDictionary::new("test")
        .with_message(
            RawField::message("p", "Parent")
                .with_field(RawField::field("p.x", "X").with_type(ScalarType::Integer))
                .with_field(RawField::field("p.y", "Y").with_type(ScalarType::Integer)),
        )
        .with_message(
            RawField::message("c", "Child")
                .with_reference("p")
                .with_field(RawField::field("c.y", "Y").with_type(ScalarType::String))
                .with_field(RawField::field("c.z", "Z").with_type(ScalarType::Boolean)),
        );

    let plain = DictionaryLoader::new()
        .with_aggregation(false)
        .convert(&raw)
        .unwrap();
    let child = plain.message("Child").unwrap();
    assert_eq!(field_names(child), ["Y", "Z"]);
    assert_eq!(child.reference_name(), Some("Parent"));

    let aggregated = DictionaryLoader::new().convert(&raw).unwrap();
    let child = aggregated.message("Child").unwrap();
    assert_eq!(field_names(child), ["X", "Y", "Z"]);
    assert_eq!(
        child.field("Y").unwrap().scalar_type(),
        Some(ScalarType::String)
    );
}

#[test]
fn test_namespace_override() {
    let dictionary = DictionaryLoader::new()
        .with_namespace("custom")
        .convert(&orders())
        .unwrap();

    assert_eq!(dictionary.namespace(), "custom");
    assert_eq!(dictionary.field("Qty").unwrap().namespace(), "custom");
    assert_eq!(dictionary.message("Order").unwrap().namespace(), "custom");
}

#[test]
fn test_missing_namespace() {
    assert_matches!(
        DictionaryLoader::new().convert(&RawDictionary::new("")),
        Err(Error::Validation(ValidationError::MissingName(_)))
    );
}

// Settings and formats

#[test]
fn test_settings_defaults() {
    let settings: LoaderSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, LoaderSettings::default());
    assert!(settings.aggregate);
    assert_eq!(settings.namespace, None);

    let settings: LoaderSettings =
        serde_json::from_str(r#"{ "aggregate": false, "namespace": "fix" }"#).unwrap();
    assert!(!settings.aggregate);
    assert_eq!(settings.namespace.as_deref(), Some("fix"));

    let loader = DictionaryLoader::new().with_settings(settings.clone());
    assert_eq!(loader.settings(), &settings);
}

#[test]
fn test_format_from_path() {
    assert_eq!(Format::from_path(Path::new("a/orders.xml")).unwrap(), Format::Xml);
    assert_eq!(Format::from_path(Path::new("orders.JSON")).unwrap(), Format::Json);
    assert_eq!(Format::from_path(Path::new("orders.yml")).unwrap(), Format::Yaml);
    assert_eq!(Format::from_path(Path::new("orders.yaml")).unwrap(), Format::Yaml);
    assert_eq!(Format::from_path(Path::new("orders.xsd")).unwrap(), Format::Xsd);
    assert_matches!(
        Format::from_path(Path::new("orders.txt")),
        Err(Error::UnknownFormat(_))
    );
    assert_matches!(
        Format::from_path(Path::new("orders")),
        Err(Error::UnknownFormat(_))
    );
}

#[test]
fn test_format_names() {
    for format in Format::ALL {
        assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
    }
}

// Loading

#[test]
fn test_load_xml_file() {
    let file = TestFile::new("orders.xml", ORDERS_XML);

    check_orders(&DictionaryLoader::new().load(file.path()).unwrap());
    check_orders(&DictionaryLoader::new().load_xml(file.path()).unwrap());
}

#[test]
fn test_load_json_file() {
    let file = TestFile::new("orders.json", ORDERS_JSON);

    check_orders(&DictionaryLoader::new().load(file.path()).unwrap());
}

#[test]
fn test_load_yaml_file() {
    let file = TestFile::new("orders.yml", ORDERS_YAML);

    check_orders(&DictionaryLoader::new().load_yaml(file.path()).unwrap());
}

#[test]
fn test_load_xsd_file() {
    let file = TestFile::new("orders.xsd", ORDERS_XSD);

    check_orders(&DictionaryLoader::new().load(file.path()).unwrap());
}

#[test]
fn test_load_with_explicit_format() {
    let file = TestFile::new("orders.dict", ORDERS_JSON);

    assert_matches!(
        DictionaryLoader::new().load(file.path()),
        Err(Error::UnknownFormat(_))
    );
    check_orders(
        &DictionaryLoader::new()
            .load_format(file.path(), Format::Json)
            .unwrap(),
    );
}

#[test]
fn test_load_missing_file() {
    assert_matches!(
        DictionaryLoader::new().load("/nonexistent/orders.xml"),
        Err(Error::Io(_))
    );
}

#[test]
fn test_formats_agree() {
    let loader = DictionaryLoader::new();

    let xml = loader.load_xml_str(ORDERS_XML).unwrap();
    let json = loader.load_json_str(ORDERS_JSON).unwrap();
    let yaml = loader.load_yaml_str(ORDERS_YAML).unwrap();
    assert_eq!(json, yaml);
    assert_eq!(
        xml.message("Order").unwrap().field("Qty"),
        json.message("Order").unwrap().field("Qty")
    );
    check_orders(&loader.load_xsd_str(ORDERS_XSD).unwrap());
}
