//! Errors raised while loading and resolving a dictionary.
//!
//! Every failure surfaces as a single [`Error`]; there is no partial
//! result. Failures raised while a message is being built are wrapped in
//! [`Error::Message`] so the chain names every enclosing message.

use std::io;

use dictforge_core::CastError;

/// Dictionary build failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input/output error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed XML dictionary document
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::de::DeError),

    /// Malformed JSON dictionary document
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Malformed YAML dictionary document
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Malformed XML Schema document
    #[error("XSD parsing error: {0}")]
    XsdParse(#[from] xmltree::ParseError),

    /// XML Schema document is well formed but not usable as a dictionary
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(String),

    /// Dictionary file format could not be determined
    #[error("Unknown dictionary format: {0}")]
    UnknownFormat(String),

    /// Dictionary shape is invalid
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Reference could not be resolved
    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Literal value does not match its declared type
    #[error("Type coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// Failure while building the named message
    #[error("Failed to build message {name}: {source}")]
    Message {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn in_message(name: &str, source: Error) -> Error {
        Error::Message {
            name: name.to_owned(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, skipping [`Error::Message`] wrappers.
    pub fn root_cause(&self) -> &Error {
        let mut error = self;
        while let Error::Message { source, .. } = error {
            error = &**source;
        }
        error
    }

    /// Returns the names of the enclosing messages, outermost first.
    pub fn message_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut error = self;
        while let Error::Message { name, source } = error {
            path.push(name.as_str());
            error = &**source;
        }
        path
    }
}

/// Errors related to dictionary shape.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Field or message declared without a name
    #[error("Unnamed field or message in {0}")]
    MissingName(String),

    /// Field declares neither a type nor a reference
    #[error("Field {0} has neither type nor reference")]
    MissingTypeAndReference(String),

    /// Reference chain of a field never reaches a scalar type
    #[error("Field {0} does not resolve to a scalar type")]
    UnresolvedType(String),

    /// Message (or field referencing a message) declared among dictionary fields
    #[error("Cannot keep message {0} in fields")]
    MessageInFields(String),

    /// Two dictionary level fields share a name
    #[error("Duplicated field {0}")]
    DuplicatedField(String),

    /// Two fields of one message share a name
    #[error("Duplicated field {field} in message {message}")]
    DuplicatedMessageField { message: String, field: String },

    /// Messages sharing a name, every occurrence listed
    #[error("Duplicated messages: {}", .0.join(", "))]
    DuplicatedMessages(Vec<String>),

    /// Enumerated value declared twice at the same level
    #[error("Duplicated value {value} in {owner}")]
    DuplicatedValue { owner: String, value: String },

    /// Two nodes share an id
    #[error("Duplicated id {0}")]
    DuplicatedId(String),
}

/// Errors related to references between declarations.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Reference to an id (or name) that is not declared
    #[error("Unknown reference {reference} in {owner}")]
    UnknownReference { owner: String, reference: String },

    /// Message references a plain field
    #[error("Message {message} references field {reference}, expected a message")]
    ReferenceToField { message: String, reference: String },

    /// Message reference chain returns to a message under construction
    #[error("Recursion at message id '{0}' detected")]
    RecursiveMessage(String),

    /// Field type reference chain is cyclic, ids sorted
    #[error("Recursive reference detected: [{}]", .0.join(", "))]
    RecursiveReference(Vec<String>),

    /// Placeholders left without a built message after a pass
    #[error("Unfilled forward reference: {}", .0.join(", "))]
    UnfilledForwardReference(Vec<String>),

    /// Schema type that is neither declared nor built in
    #[error("Unknown type {reference} in {owner}")]
    UnknownType { owner: String, reference: String },
}

/// Literal attribute, value, default or facet that does not fit its type.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {kind} {name} of {owner}: {source}")]
pub struct CoercionError {
    pub owner: String,
    pub kind: &'static str,
    pub name: String,
    #[source]
    pub source: CastError,
}
