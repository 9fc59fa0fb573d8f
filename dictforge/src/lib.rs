//! # dictforge
//!
//! Protocol dictionary toolset.
//!
//! - [`ScalarType`], [`Value`] and [`cast_value`] for typed literals
//! - [`dictionary`] (feature `dictionary`, enabled by default) for loading
//!   XML, JSON/YAML and XSD dictionaries into resolved structures

pub use dictforge_core::{CastError, ScalarType, UnknownScalarType, Value, cast_value};

#[cfg(feature = "dictionary")]
pub mod dictionary {
    pub use dictforge_dictionary::*;
}
