//! Scalar type and default value resolution along field reference chains.

use std::collections::BTreeSet;

use dictforge_core::ScalarType;

use crate::{
    Error, ReferenceError,
    raw::{RawField, RawIndex},
};


pub(crate) struct TypeResolver<'i, 'a> {
    index: &'i RawIndex<'a>,
}

impl<'i, 'a> TypeResolver<'i, 'a> {
    pub(crate) fn new(index: &'i RawIndex<'a>) -> TypeResolver<'i, 'a> {
        TypeResolver { index }
    }

    /// Returns the scalar type of `field`.
    ///
    /// Without `search` only the field's own declaration counts. With it,
    /// the first declared type along the reference chain wins. A chain that
    /// ends on a message, or without any declared type, yields `None`.
    pub(crate) fn resolve_type(
        &self,
        field: &RawField,
        search: bool,
    ) -> Result<Option<ScalarType>, Error> {
        if !search || field.scalar_type.is_some() {
            return Ok(field.scalar_type);
        }

        let mut visited: BTreeSet<&str> = field.id.as_deref().into_iter().collect();
        let mut current = field;
        loop {
            if let Some(scalar_type) = current.scalar_type {
                return Ok(Some(scalar_type));
            }
            let Some(reference) = current.reference.as_deref() else {
                return Ok(None);
            };
            if !visited.insert(reference) {
                return Err(Error::Reference(ReferenceError::RecursiveReference(
                    visited.into_iter().map(str::to_owned).collect(),
                )));
            }
            match self.index.reference_of(current)? {
                Some(next) if !next.is_message() => current = next,
                _ => return Ok(None),
            }
        }
    }

    /// Returns the default value literal of `field`.
    ///
    /// With `search` the nearest default along the reference chain is taken.
    pub(crate) fn resolve_default<'f>(
        &self,
        field: &'f RawField,
        search: bool,
    ) -> Result<Option<&'f str>, Error>
    where
        'a: 'f,
    {
        if !search || field.default_value.is_some() {
            return Ok(field.default_value.as_deref());
        }

        let mut visited: BTreeSet<&str> = field.id.as_deref().into_iter().collect();
        let mut current = field;
        while let Some(next) = self.index.reference_of(current)? {
            if next.is_message() || next.id.as_deref().is_some_and(|id| !visited.insert(id)) {
                break;
            }
            if let Some(default_value) = next.default_value.as_deref() {
                return Ok(Some(default_value));
            }
            current = next;
        }

        Ok(None)
    }
}
