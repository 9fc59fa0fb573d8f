//! # dictforge-core
//!
//! Scalar types shared by every dictionary format and the pure conversion
//! of literal attribute values into typed [`Value`]s.
//!
//! ```rust
//! use dictforge_core::{ScalarType, Value, cast_value};
//!
//! let value = cast_value("42", ScalarType::Integer).unwrap();
//! assert_eq!(value, Some(Value::Integer(42)));
//! ```

mod types;
mod value;

pub use types::{ScalarType, UnknownScalarType};
pub use value::{CastError, Value, cast_value};
