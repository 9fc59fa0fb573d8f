//! Resolved, cross-referenced dictionary structures.
//!
//! Structures are immutable once built. A message-valued field does not own
//! the message it embeds: it names it, and the name is a key into
//! [`DictionaryStructure::messages`]. Use [`DictionaryStructure::message_of`]
//! to follow such a field.

use dictforge_core::{ScalarType, Value, cast_value};
use indexmap::IndexMap;
use serde::Serialize;

use crate::{CoercionError, Error, raw::RawAttribute};

/// Attributes (or enumerated values) keyed by name, in declaration order.
pub type Attributes = IndexMap<String, AttributeStructure>;

/// Message fields keyed by name, in declaration order.
pub type Fields = IndexMap<String, FieldStructure>;

/// A named literal with its declared type and converted value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributeStructure {
    name: String,
    value: Option<String>,
    cast_value: Option<Value>,
    scalar_type: ScalarType,
}

impl AttributeStructure {
    /// Builds an attribute, converting its literal to the declared type.
    ///
    /// `owner` and `kind` only describe the attribute in errors.
    pub(crate) fn new(
        owner: &str,
        kind: &'static str,
        name: String,
        value: Option<String>,
        scalar_type: ScalarType,
    ) -> Result<AttributeStructure, Error> {
        let cast_value = match value.as_deref() {
            Some(literal) => cast_value(literal, scalar_type).map_err(|source| {
                Error::Coercion(CoercionError {
                    owner: owner.to_owned(),
                    kind,
                    name: name.clone(),
                    source,
                })
            })?,
            None => None,
        };

        Ok(AttributeStructure {
            name,
            value,
            cast_value,
            scalar_type,
        })
    }

    pub(crate) fn from_raw(
        owner: &str,
        kind: &'static str,
        raw: &RawAttribute,
    ) -> Result<AttributeStructure, Error> {
        AttributeStructure::new(owner, kind, raw.name.clone(), raw.value.clone(), raw.scalar_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The literal as declared
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The literal converted to [`AttributeStructure::scalar_type`]
    pub fn cast_value(&self) -> Option<&Value> {
        self.cast_value.as_ref()
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar_type
    }
}

/// Whether a field holds a scalar or embeds a message.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum FieldKind {
    Simple,
    /// Embedded message, addressed by its name in the dictionary
    Message { message: String },
}

/// A resolved field, either dictionary level or a member of a message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldStructure {
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) description: Option<String>,
    pub(crate) reference_name: Option<String>,
    pub(crate) attributes: Attributes,
    pub(crate) values: Attributes,
    pub(crate) scalar_type: Option<ScalarType>,
    pub(crate) required: bool,
    pub(crate) collection: bool,
    pub(crate) service_name: bool,
    pub(crate) default_value: Option<Value>,
    pub(crate) kind: FieldKind,
}

impl FieldStructure {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Name of the referenced field or message, if the declaration had a reference
    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeStructure> {
        self.attributes.get(name)
    }

    /// Enumerated values, empty unless the field is an enumeration
    pub fn values(&self) -> &Attributes {
        &self.values
    }

    /// Resolved scalar type, `None` for message-valued fields
    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.scalar_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    pub fn is_service_name(&self) -> bool {
        self.service_name
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Name of the embedded message, for message-valued fields
    pub fn message_name(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Message { message } => Some(message),
            FieldKind::Simple => None,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.kind, FieldKind::Message { .. })
    }

    pub fn is_enum(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn is_simple(&self) -> bool {
        !self.is_complex() && !self.is_enum()
    }
}

/// A resolved message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageStructure {
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) description: Option<String>,
    pub(crate) reference_name: Option<String>,
    pub(crate) attributes: Attributes,
    pub(crate) fields: Fields,
}

impl MessageStructure {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Name of the message this one refers to (inherits from, when aggregating)
    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeStructure> {
        self.attributes.get(name)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldStructure> {
        self.fields.get(name)
    }
}

/// The fully resolved dictionary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DictionaryStructure {
    pub(crate) namespace: String,
    pub(crate) description: Option<String>,
    pub(crate) attributes: Attributes,
    pub(crate) fields: Fields,
    pub(crate) messages: IndexMap<String, MessageStructure>,
}

impl DictionaryStructure {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeStructure> {
        self.attributes.get(name)
    }

    /// Dictionary level fields
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldStructure> {
        self.fields.get(name)
    }

    /// All messages, nested ones included
    pub fn messages(&self) -> &IndexMap<String, MessageStructure> {
        &self.messages
    }

    pub fn message(&self, name: &str) -> Option<&MessageStructure> {
        self.messages.get(name)
    }

    /// Follows a message-valued field to the message it embeds.
    pub fn message_of(&self, field: &FieldStructure) -> Option<&MessageStructure> {
        field.message_name().and_then(|name| self.messages.get(name))
    }
}
