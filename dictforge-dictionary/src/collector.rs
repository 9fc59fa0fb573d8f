//! Attribute and enumerated value collection along reference chains.

use std::collections::HashSet;

use dictforge_core::ScalarType;
use tracing::trace;

use crate::{
    Error, ValidationError,
    raw::{RawAttribute, RawField, RawIndex},
    structure::{AttributeStructure, Attributes},
};


/// What to collect from each declaration of a chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Collect {
    Attributes,
    /// Enumerated values, converted to the given type when it is known
    Values(Option<ScalarType>),
}

impl Collect {
    fn kind(&self) -> &'static str {
        match self {
            Collect::Attributes => "attribute",
            Collect::Values(_) => "value",
        }
    }
}

/// Merges attributes or values of a declaration with those of its references.
///
/// With aggregation disabled only the declaration itself is looked at.
pub(crate) struct Collector<'i, 'a> {
    index: &'i RawIndex<'a>,
    aggregate: bool,
}

impl<'i, 'a> Collector<'i, 'a> {
    pub(crate) fn new(index: &'i RawIndex<'a>, aggregate: bool) -> Collector<'i, 'a> {
        Collector { index, aggregate }
    }

    pub(crate) fn attributes(&self, field: &RawField) -> Result<Option<Attributes>, Error> {
        self.collect(field, Collect::Attributes)
    }

    pub(crate) fn values(
        &self,
        field: &RawField,
        scalar_type: Option<ScalarType>,
    ) -> Result<Option<Attributes>, Error> {
        self.collect(field, Collect::Values(scalar_type))
    }

    /// Collects along the reference chain, nearest declaration wins.
    ///
    /// Returns `None` when nothing was collected.
    pub(crate) fn collect(&self, field: &RawField, what: Collect) -> Result<Option<Attributes>, Error> {
        let chain = self.chain(field)?;
        let mut collected = Attributes::new();

        // Farthest ancestor first, so nearer declarations replace it
        for node in chain.iter().rev() {
            let own = match what {
                Collect::Attributes => &node.attributes,
                Collect::Values(_) => &node.values,
            };
            if let Collect::Values(_) = what {
                check_duplicated_values(node, own)?;
            }
            for raw in own {
                let scalar_type = match what {
                    Collect::Values(Some(scalar_type)) => scalar_type,
                    _ => raw.scalar_type,
                };
                let attribute = AttributeStructure::new(
                    field.display_name(),
                    what.kind(),
                    raw.name.clone(),
                    raw.value.clone(),
                    scalar_type,
                )?;
                override_entry(&mut collected, attribute);
            }
        }

        Ok((!collected.is_empty()).then_some(collected))
    }

    fn chain<'f>(&self, field: &'f RawField) -> Result<Vec<&'f RawField>, Error>
    where
        'a: 'f,
    {
        let mut chain = vec![field];
        if !self.aggregate {
            return Ok(chain);
        }

        let mut visited: HashSet<&str> = field.id.as_deref().into_iter().collect();
        let mut current = field;
        while let Some(next) = self.index.reference_of(current)? {
            if let Some(id) = next.id.as_deref() {
                if !visited.insert(id) {
                    // The chain circled back, everything further is already counted
                    trace!(field = field.display_name(), id, "reference chain circled");
                    break;
                }
            }
            chain.push(next);
            current = next;
        }

        Ok(chain)
    }
}

/// Collects a flat list of attributes, later declarations replace earlier ones.
pub(crate) fn collect_attributes(
    owner: &str,
    attributes: &[RawAttribute],
) -> Result<Attributes, Error> {
    let mut collected = Attributes::new();
    for raw in attributes {
        override_entry(
            &mut collected,
            AttributeStructure::from_raw(owner, "attribute", raw)?,
        );
    }
    Ok(collected)
}

/// Replaces a same-named entry by removing it and appending the new one.
pub(crate) fn override_entry(collected: &mut Attributes, attribute: AttributeStructure) {
    collected.shift_remove(attribute.name());
    collected.insert(attribute.name().to_owned(), attribute);
}

fn check_duplicated_values(node: &RawField, values: &[RawAttribute]) -> Result<(), Error> {
    let mut names = HashSet::with_capacity(values.len());
    for value in values {
        if !names.insert(value.name.as_str()) {
            return Err(Error::Validation(ValidationError::DuplicatedValue {
                owner: node.display_name().to_owned(),
                value: value.name.clone(),
            }));
        }
    }
    Ok(())
}
