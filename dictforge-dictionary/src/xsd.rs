//! XML Schema dictionaries.
//!
//! A schema is first read into the [`Schema`] model, then walked:
//! - complex types and elements of complex type become messages
//! - elements of simple type and attributes become fields
//! - enumerations become field values, other facets field attributes
//! - `xs:appinfo` attributes are attached to the annotated structure
//!
//! Extensions list the fields of their base first. Attributes and values
//! are not aggregated along reference chains here, the schema already
//! spells them out per type.

mod reader;
mod schema;
mod walker;


pub use reader::read_schema;
pub use schema::{
    Annotation, AttributeDecl, ComplexType, ElementDecl, Facet, FacetKind, Group, GroupKind,
    MaxOccurs, Particle, Schema, SimpleDerivation, SimpleType, TypeDef, builtin_type,
};
use walker::SchemaWalker;

use crate::{Error, ValidationError, dictionary::LoaderSettings, structure::DictionaryStructure};

/// Resolves a schema, the namespace defaults to its `targetNamespace`.
pub(crate) fn convert(
    schema: &Schema,
    settings: &LoaderSettings,
) -> Result<DictionaryStructure, Error> {
    let namespace = settings
        .namespace
        .clone()
        .or_else(|| schema.target_namespace.clone())
        .filter(|namespace| !namespace.is_empty())
        .ok_or_else(|| Error::Validation(ValidationError::MissingName("schema".into())))?;

    SchemaWalker::new(schema, namespace).walk()
}
