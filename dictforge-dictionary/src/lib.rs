//! # dictforge-dictionary
//!
//! Loads protocol dictionaries and resolves them into cross-referenced
//! structures.
//!
//! A dictionary declares fields and messages. Declarations may reference
//! each other to inherit a type, attributes, enumerated values, a default
//! value or, for messages, a whole set of fields. Resolution follows those
//! references and produces self-contained [`FieldStructure`]s and
//! [`MessageStructure`]s gathered in a [`DictionaryStructure`].
//!
//! ## Formats
//!
//! - XML dictionaries ([`xml`])
//! - JSON and YAML dictionaries ([`json`])
//! - XML Schema ([`xsd`])
//!
//! Every format yields the same structures, so consumers cannot tell where
//! a dictionary came from.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use dictforge_dictionary::DictionaryLoader;
//!
//! let dictionary = DictionaryLoader::new()
//!     .with_aggregation(true)
//!     .load("path/to/orders.xml")
//!     .expect("Failed to load dictionary");
//!
//! if let Some(order) = dictionary.message("Order") {
//!     for field in order.fields().values() {
//!         println!("{}: {:?}", field.name(), field.scalar_type());
//!     }
//! }
//! ```
//!
//! Dictionaries already held in memory go through [`DictionaryLoader::convert`]:
//!
//! ```rust
//! use dictforge_core::ScalarType;
//! use dictforge_dictionary::{DictionaryLoader, RawDictionary, RawField};
//!
//! let raw = RawDictionary::new("orders")
//!     .with_field(RawField::field("qty", "Qty").with_type(ScalarType::Integer))
//!     .with_message(
//!         RawField::message("order", "Order")
//!             .with_field(RawField::field("order.qty", "Qty").with_reference("qty")),
//!     );
//!
//! let dictionary = DictionaryLoader::new().convert(&raw).unwrap();
//! let qty = dictionary.message("Order").unwrap().field("Qty").unwrap();
//! assert_eq!(qty.scalar_type(), Some(ScalarType::Integer));
//! ```

mod builder;
mod collector;
mod dictionary;
mod error;
mod raw;
mod resolver;
mod structure;

pub mod json;
pub mod xml;
pub mod xsd;

pub use dictionary::{DictionaryLoader, Format, LoaderSettings};
pub use error::{CoercionError, Error, ReferenceError, ValidationError};
pub use raw::{RawAttribute, RawDictionary, RawField, RawIndex, RawKind};
pub use structure::{
    AttributeStructure, Attributes, DictionaryStructure, FieldKind, FieldStructure, Fields,
    MessageStructure,
};
