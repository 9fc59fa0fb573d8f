//! JSON and YAML dictionary documents.
//!
//! Both formats share one serde model. Fields and messages are maps keyed by
//! name, kept in document order:
//!
//! ```yaml
//! name: orders
//! fields:
//!   Qty: { type: INTEGER, required: true, values: { One: 1 } }
//! messages:
//!   Order:
//!     fields:
//!       Qty: { reference: Qty }
//!       Legs:
//!         collection: true
//!         fields:
//!           Px: { type: DECIMAL }
//! ```
//!
//! References name a dictionary level message or field; messages are
//! searched first. A linking pass rewrites them into ids once the whole
//! document is read. Dictionary level declarations without an explicit
//! `id` use their name as id.

use std::collections::HashMap;

use dictforge_core::ScalarType;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    Error, ReferenceError,
    raw::{RawAttribute, RawDictionary, RawField, RawKind},
};

#[cfg(test)]
mod tests;

/// Scalar literal as written in the document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<Literal> for String {
    fn from(literal: Literal) -> String {
        match literal {
            Literal::Boolean(value) => value.to_string(),
            Literal::Integer(value) => value.to_string(),
            Literal::Float(value) => value.to_string(),
            Literal::String(value) => value,
        }
    }
}

/// Attribute or enumerated value, either a bare literal or typed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Attribute {
    Typed {
        value: Option<Literal>,
        #[serde(rename = "type")]
        scalar_type: Option<ScalarType>,
    },
    Plain(Literal),
}

impl Attribute {
    fn into_raw(self, name: String) -> RawAttribute {
        match self {
            Attribute::Typed { value, scalar_type } => RawAttribute {
                name,
                value: value.map(String::from),
                scalar_type: scalar_type.unwrap_or_default(),
            },
            Attribute::Plain(value) => RawAttribute {
                name,
                value: Some(value.into()),
                scalar_type: ScalarType::String,
            },
        }
    }
}

/// Field or message declaration.
///
/// A field carrying `fields` declares an inline sub-message.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub scalar_type: Option<ScalarType>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub collection: bool,
    pub service_name: bool,
    pub default_value: Option<Literal>,
    pub attributes: IndexMap<String, Attribute>,
    pub values: IndexMap<String, Attribute>,
    pub fields: Option<IndexMap<String, Node>>,
}

impl Node {
    fn into_raw(self, name: String, id: Option<String>) -> RawField {
        let kind = match self.fields {
            Some(fields) => RawKind::Message {
                fields: fields
                    .into_iter()
                    .map(|(name, node)| {
                        let id = node.id.clone();
                        node.into_raw(name, id)
                    })
                    .collect(),
            },
            None => RawKind::Field,
        };

        RawField {
            id,
            name: Some(name),
            description: self.description,
            reference: self.reference,
            scalar_type: self.scalar_type,
            required: self.required,
            collection: self.collection,
            service_name: self.service_name,
            default_value: self.default_value.map(String::from),
            attributes: into_raw_attributes(self.attributes),
            values: into_raw_attributes(self.values),
            kind,
        }
    }

    /// Converts a dictionary level declaration, its id defaults to its name.
    fn into_top_level(self, name: String) -> RawField {
        let id = self.id.clone().unwrap_or_else(|| name.clone());
        self.into_raw(name, Some(id))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dictionary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
    #[serde(default)]
    pub fields: IndexMap<String, Node>,
    #[serde(default)]
    pub messages: IndexMap<String, Node>,
}

fn into_raw_attributes(attributes: IndexMap<String, Attribute>) -> Vec<RawAttribute> {
    attributes
        .into_iter()
        .map(|(name, attribute)| attribute.into_raw(name))
        .collect()
}

impl Dictionary {
    /// Converts the document and links references to ids.
    pub fn into_raw(self) -> Result<RawDictionary, Error> {
        let mut raw = RawDictionary::new(self.name);
        raw.description = self.description;
        raw.attributes = into_raw_attributes(self.attributes);
        raw.fields = self
            .fields
            .into_iter()
            .map(|(name, node)| node.into_top_level(name))
            .collect();
        raw.messages = self
            .messages
            .into_iter()
            .map(|(name, node)| node.into_top_level(name).into_message())
            .collect();

        link_references(&mut raw)?;
        Ok(raw)
    }
}

/// Rewrites every reference name into the id of the declaration it names.
fn link_references(raw: &mut RawDictionary) -> Result<(), Error> {
    let mut targets: HashMap<String, String> = HashMap::new();
    // Messages inserted last so they win over same-named fields
    for node in raw.fields.iter().chain(raw.messages.iter()) {
        if let (Some(name), Some(id)) = (&node.name, &node.id) {
            targets.insert(name.clone(), id.clone());
        }
    }

    let mut stack: Vec<&mut RawField> = raw
        .fields
        .iter_mut()
        .chain(raw.messages.iter_mut())
        .collect();
    while let Some(node) = stack.pop() {
        if let Some(reference) = node.reference.as_deref() {
            let id = targets.get(reference).cloned().ok_or_else(|| {
                Error::Reference(ReferenceError::UnknownReference {
                    owner: node.display_name().to_owned(),
                    reference: reference.to_owned(),
                })
            })?;
            node.reference = Some(id);
        }
        if let RawKind::Message { fields } = &mut node.kind {
            stack.extend(fields.iter_mut());
        }
    }

    Ok(())
}

/// Reads a JSON dictionary document.
pub fn read_json_dictionary(json: &str) -> Result<RawDictionary, Error> {
    serde_json::from_str::<Dictionary>(json)?.into_raw()
}

/// Reads a YAML dictionary document.
pub fn read_yaml_dictionary(yaml: &str) -> Result<RawDictionary, Error> {
    serde_yaml::from_str::<Dictionary>(yaml)?.into_raw()
}
