use std::{fmt, str::FromStr};

/// Primitive data type a dictionary field ultimately resolves to.
///
/// Textual names follow the dictionary file conventions (`INTEGER`,
/// `DATE_TIME`, ...). A few short aliases seen in hand written
/// dictionaries (`INT`, `BOOL`, `CHARACTER`) are accepted on input.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(
    any(feature = "serde-serialize", feature = "serde-deserialize"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(
    any(feature = "serde-serialize", feature = "serde-deserialize"),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum ScalarType {
    /// `true` / `false`
    #[cfg_attr(
        any(feature = "serde-serialize", feature = "serde-deserialize"),
        serde(alias = "BOOL")
    )]
    Boolean,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    #[cfg_attr(
        any(feature = "serde-serialize", feature = "serde-deserialize"),
        serde(alias = "INT")
    )]
    Integer,
    /// 64-bit signed integer
    Long,
    /// 8-bit signed integer
    Byte,
    /// Single precision floating point number
    Float,
    /// Double precision floating point number
    Double,
    /// Character string, the type of every untyped attribute
    #[default]
    String,
    /// Exactly one character
    #[cfg_attr(
        any(feature = "serde-serialize", feature = "serde-deserialize"),
        serde(alias = "CHARACTER")
    )]
    Char,
    /// Arbitrary precision decimal number
    Decimal,
    /// Local date and time (`2024-01-31T12:30:00.000`)
    DateTime,
    /// Local date (`2024-01-31`)
    Date,
    /// Local time (`12:30:00.000`)
    Time,
}

impl ScalarType {
    /// All scalar types, in declaration order.
    pub const ALL: [ScalarType; 13] = [
        ScalarType::Boolean,
        ScalarType::Short,
        ScalarType::Integer,
        ScalarType::Long,
        ScalarType::Byte,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::String,
        ScalarType::Char,
        ScalarType::Decimal,
        ScalarType::DateTime,
        ScalarType::Date,
        ScalarType::Time,
    ];

    /// Returns the canonical textual name of this type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Short => "SHORT",
            ScalarType::Integer => "INTEGER",
            ScalarType::Long => "LONG",
            ScalarType::Byte => "BYTE",
            ScalarType::Float => "FLOAT",
            ScalarType::Double => "DOUBLE",
            ScalarType::String => "STRING",
            ScalarType::Char => "CHAR",
            ScalarType::Decimal => "DECIMAL",
            ScalarType::DateTime => "DATE_TIME",
            ScalarType::Date => "DATE",
            ScalarType::Time => "TIME",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown scalar type `{0}`")]
pub struct UnknownScalarType(pub String);

impl FromStr for ScalarType {
    type Err = UnknownScalarType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INT" => return Ok(ScalarType::Integer),
            "BOOL" => return Ok(ScalarType::Boolean),
            "CHARACTER" => return Ok(ScalarType::Char),
            _ => {}
        }
        ScalarType::ALL
            .into_iter()
            .find(|scalar_type| scalar_type.as_str() == s)
            .ok_or_else(|| UnknownScalarType(s.to_owned()))
    }
}
