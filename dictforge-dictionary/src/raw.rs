//! Format-neutral dictionary model.
//!
//! Every format loader (XML, JSON/YAML) produces a [`RawDictionary`]. Nodes
//! are owned by the dictionary; links between them are plain string ids
//! resolved through a [`RawIndex`], so reference graphs may contain cycles
//! without any ownership trouble.

use std::collections::HashMap;

use dictforge_core::ScalarType;

use crate::{Error, ReferenceError, ValidationError};

/// A named literal attached to a dictionary, message or field.
///
/// Enumerated field values use the same shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawAttribute {
    pub name: String,
    pub value: Option<String>,
    /// Declared type, [`ScalarType::String`] when not declared
    pub scalar_type: ScalarType,
}

impl RawAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> RawAttribute {
        RawAttribute {
            name: name.into(),
            value: Some(value.into()),
            scalar_type: ScalarType::String,
        }
    }

    pub fn typed(
        name: impl Into<String>,
        value: impl Into<String>,
        scalar_type: ScalarType,
    ) -> RawAttribute {
        RawAttribute {
            name: name.into(),
            value: Some(value.into()),
            scalar_type,
        }
    }
}

/// What a raw node is: a scalar field or a message owning child fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawKind {
    #[default]
    Field,
    Message { fields: Vec<RawField> },
}

/// A field or message declaration as read from a dictionary file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawField {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Id of the referenced field or message
    pub reference: Option<String>,
    pub scalar_type: Option<ScalarType>,
    pub required: bool,
    pub collection: bool,
    pub service_name: bool,
    pub default_value: Option<String>,
    pub attributes: Vec<RawAttribute>,
    pub values: Vec<RawAttribute>,
    pub kind: RawKind,
}

impl RawField {
    /// Creates a scalar field declaration.
    pub fn field(id: impl Into<String>, name: impl Into<String>) -> RawField {
        RawField {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Creates an empty message declaration.
    pub fn message(id: impl Into<String>, name: impl Into<String>) -> RawField {
        RawField {
            id: Some(id.into()),
            name: Some(name.into()),
            kind: RawKind::Message { fields: Vec::new() },
            ..Default::default()
        }
    }

    pub fn with_type(mut self, scalar_type: ScalarType) -> RawField {
        self.scalar_type = Some(scalar_type);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> RawField {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> RawField {
        self.required = required;
        self
    }

    pub fn with_collection(mut self, collection: bool) -> RawField {
        self.collection = collection;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> RawField {
        self.description = Some(description.into());
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> RawField {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_attribute(mut self, attribute: RawAttribute) -> RawField {
        self.attributes.push(attribute);
        self
    }

    pub fn with_value(mut self, value: RawAttribute) -> RawField {
        self.values.push(value);
        self
    }

    /// Turns a scalar declaration into an empty message, keeping messages as they are.
    pub fn into_message(mut self) -> RawField {
        if let RawKind::Field = self.kind {
            self.kind = RawKind::Message { fields: Vec::new() };
        }
        self
    }

    /// Appends a child field; turns a scalar declaration into a message.
    pub fn with_field(self, field: RawField) -> RawField {
        let mut message = self.into_message();
        if let RawKind::Message { fields } = &mut message.kind {
            fields.push(field);
        }
        message
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, RawKind::Message { .. })
    }

    /// Child declarations, empty for scalar fields.
    pub fn fields(&self) -> &[RawField] {
        match &self.kind {
            RawKind::Message { fields } => fields,
            RawKind::Field => &[],
        }
    }

    /// Name used in diagnostics when the declaration has none.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// A whole dictionary as read from a file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDictionary {
    pub name: String,
    pub description: Option<String>,
    pub attributes: Vec<RawAttribute>,
    pub fields: Vec<RawField>,
    pub messages: Vec<RawField>,
}

impl RawDictionary {
    pub fn new(name: impl Into<String>) -> RawDictionary {
        RawDictionary {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: RawField) -> RawDictionary {
        self.fields.push(field);
        self
    }

    pub fn with_message(mut self, message: RawField) -> RawDictionary {
        self.messages.push(message);
        self
    }

    pub fn with_attribute(mut self, attribute: RawAttribute) -> RawDictionary {
        self.attributes.push(attribute);
        self
    }
}

/// Id lookup over every node of a [`RawDictionary`], nested ones included.
#[derive(Debug)]
pub struct RawIndex<'a> {
    nodes: HashMap<&'a str, &'a RawField>,
}

impl<'a> RawIndex<'a> {
    pub fn new(dictionary: &'a RawDictionary) -> Result<RawIndex<'a>, Error> {
        let mut nodes = HashMap::new();
        let mut stack: Vec<&RawField> = dictionary
            .fields
            .iter()
            .chain(dictionary.messages.iter())
            .collect();

        while let Some(node) = stack.pop() {
            if let Some(id) = node.id.as_deref() {
                if nodes.insert(id, node).is_some() {
                    return Err(Error::Validation(ValidationError::DuplicatedId(id.to_owned())));
                }
            }
            stack.extend(node.fields());
        }

        Ok(RawIndex { nodes })
    }

    pub fn get(&self, id: &str) -> Option<&'a RawField> {
        self.nodes.get(id).copied()
    }

    /// Resolves the reference of `field`, failing on dangling ids.
    pub fn reference_of(&self, field: &RawField) -> Result<Option<&'a RawField>, Error> {
        let Some(reference) = field.reference.as_deref() else {
            return Ok(None);
        };
        self.get(reference).map(Some).ok_or_else(|| {
            Error::Reference(ReferenceError::UnknownReference {
                owner: field.display_name().to_owned(),
                reference: reference.to_owned(),
            })
        })
    }

    /// Like [`RawIndex::reference_of`], but only messages are acceptable targets.
    pub fn message_reference_of(&self, field: &RawField) -> Result<Option<&'a RawField>, Error> {
        match self.reference_of(field)? {
            Some(target) if target.is_message() => Ok(Some(target)),
            Some(target) => Err(Error::Reference(ReferenceError::ReferenceToField {
                message: field.display_name().to_owned(),
                reference: target.display_name().to_owned(),
            })),
            None => Ok(None),
        }
    }
}
