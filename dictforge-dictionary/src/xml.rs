//! XML dictionary documents.
//!
//! The document is deserialized with serde and quick-xml, then turned into
//! the format-neutral [`RawDictionary`]:
//!
//! ```xml
//! <dictionary name="orders">
//!   <description>Order flow</description>
//!   <attribute name="version" type="INTEGER">2</attribute>
//!   <fields>
//!     <field id="qty" name="Qty" type="INTEGER" isRequired="true">
//!       <value name="One">1</value>
//!     </field>
//!   </fields>
//!   <messages>
//!     <message id="order" name="Order">
//!       <field id="order.qty" name="Qty" reference="qty"/>
//!     </message>
//!   </messages>
//! </dictionary>
//! ```

use dictforge_core::ScalarType;
use quick_xml::de::from_str;
use serde::{Deserialize, Deserializer};

use crate::{
    Error,
    raw::{RawAttribute, RawDictionary, RawField},
};

#[cfg(test)]
mod tests;

// Boolean attributes written as true/false or Y/N
mod flag {
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "true" | "Y" | "YES" | "y" | "yes" => Ok(true),
            "false" | "N" | "NO" | "n" | "no" => Ok(false),
            _ => Err(de::Error::custom(format!("invalid flag value: {s}"))),
        }
    }
}

/// Named literal, used for `<attribute>` and `<value>` elements.
#[derive(Clone, Debug, Deserialize)]
pub struct Attribute {
    #[serde(rename = "@name")]
    pub name: String,

    /// Declared type, string when missing
    #[serde(rename = "@type", default)]
    pub scalar_type: Option<ScalarType>,

    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

/// Children of a `<field>` element.
#[derive(Clone, Debug, Deserialize)]
pub enum FieldMember {
    #[serde(rename = "description")]
    Description(String),

    #[serde(rename = "attribute")]
    Attribute(Attribute),

    /// Enumerated value
    #[serde(rename = "value")]
    Value(Attribute),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Field {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@name", default)]
    pub name: Option<String>,

    #[serde(rename = "@type", default)]
    pub scalar_type: Option<ScalarType>,

    #[serde(rename = "@reference", default)]
    pub reference: Option<String>,

    #[serde(rename = "@defaultvalue", default)]
    pub default_value: Option<String>,

    #[serde(rename = "@isRequired", with = "flag", default)]
    pub required: bool,

    #[serde(rename = "@isCollection", with = "flag", default)]
    pub collection: bool,

    #[serde(rename = "@isServiceName", with = "flag", default)]
    pub service_name: bool,

    #[serde(rename = "$value", default)]
    pub members: Vec<FieldMember>,
}

/// Children of a `<message>` element, fields keep their document order.
#[derive(Clone, Debug, Deserialize)]
pub enum MessageMember {
    #[serde(rename = "description")]
    Description(String),

    #[serde(rename = "attribute")]
    Attribute(Attribute),

    #[serde(rename = "field")]
    Field(Field),

    /// Inline sub-message
    #[serde(rename = "message")]
    Message(Message),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@name", default)]
    pub name: Option<String>,

    #[serde(rename = "@reference", default)]
    pub reference: Option<String>,

    #[serde(rename = "@isRequired", with = "flag", default)]
    pub required: bool,

    #[serde(rename = "@isCollection", with = "flag", default)]
    pub collection: bool,

    #[serde(rename = "$value", default)]
    pub members: Vec<MessageMember>,
}

#[derive(Clone, Debug, Deserialize)]
pub enum DictionaryMember {
    #[serde(rename = "description")]
    Description(String),

    #[serde(rename = "attribute")]
    Attribute(Attribute),

    #[serde(rename = "fields", deserialize_with = "unwrap_fields")]
    Fields(Vec<Field>),

    #[serde(rename = "messages", deserialize_with = "unwrap_messages")]
    Messages(Vec<Message>),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename = "dictionary")]
pub struct Dictionary {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "$value", default)]
    pub members: Vec<DictionaryMember>,
}

fn unwrap_fields<'de, D>(deserializer: D) -> Result<Vec<Field>, D::Error>
where
    D: Deserializer<'de>,
{
    /// Represents <fields>...</fields>
    #[derive(Deserialize)]
    struct List {
        // default allows empty list
        #[serde(default)]
        field: Vec<Field>,
    }
    Ok(List::deserialize(deserializer)?.field)
}

fn unwrap_messages<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    /// Represents <messages>...</messages>
    #[derive(Deserialize)]
    struct List {
        #[serde(default)]
        message: Vec<Message>,
    }
    Ok(List::deserialize(deserializer)?.message)
}

impl From<Attribute> for RawAttribute {
    fn from(attribute: Attribute) -> RawAttribute {
        RawAttribute {
            name: attribute.name,
            value: attribute.value,
            scalar_type: attribute.scalar_type.unwrap_or_default(),
        }
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> RawField {
        let mut raw = RawField {
            id: field.id,
            name: field.name,
            reference: field.reference,
            scalar_type: field.scalar_type,
            required: field.required,
            collection: field.collection,
            service_name: field.service_name,
            default_value: field.default_value,
            ..RawField::default()
        };
        for member in field.members {
            match member {
                FieldMember::Description(description) => raw.description = Some(description),
                FieldMember::Attribute(attribute) => raw.attributes.push(attribute.into()),
                FieldMember::Value(value) => raw.values.push(value.into()),
            }
        }
        raw
    }
}

impl From<Message> for RawField {
    fn from(message: Message) -> RawField {
        let mut raw = RawField {
            id: message.id,
            name: message.name,
            reference: message.reference,
            required: message.required,
            collection: message.collection,
            ..RawField::default()
        }
        .into_message();
        for member in message.members {
            match member {
                MessageMember::Description(description) => raw.description = Some(description),
                MessageMember::Attribute(attribute) => raw.attributes.push(attribute.into()),
                MessageMember::Field(field) => raw = raw.with_field(field.into()),
                MessageMember::Message(message) => raw = raw.with_field(message.into()),
            }
        }
        raw
    }
}

impl From<Dictionary> for RawDictionary {
    fn from(dictionary: Dictionary) -> RawDictionary {
        let mut raw = RawDictionary::new(dictionary.name);
        for member in dictionary.members {
            match member {
                DictionaryMember::Description(description) => raw.description = Some(description),
                DictionaryMember::Attribute(attribute) => raw.attributes.push(attribute.into()),
                DictionaryMember::Fields(fields) => {
                    raw.fields.extend(fields.into_iter().map(RawField::from))
                }
                DictionaryMember::Messages(messages) => {
                    raw.messages.extend(messages.into_iter().map(RawField::from))
                }
            }
        }
        raw
    }
}

/// Reads an XML dictionary document.
pub fn read_dictionary(xml: &str) -> Result<RawDictionary, Error> {
    let dictionary: Dictionary = from_str(xml)?;
    Ok(dictionary.into())
}
