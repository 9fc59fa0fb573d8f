use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::ScalarType;

#[cfg(test)]
mod tests;

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// A literal converted to its declared [`ScalarType`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "serde-serialize", feature = "serde-deserialize"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Value {
    Boolean(bool),
    Short(i16),
    Integer(i32),
    Long(i64),
    Byte(i8),
    Float(f32),
    Double(f64),
    String(String),
    Char(char),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Value {
    /// Returns the scalar type this value belongs to.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Value::Boolean(_) => ScalarType::Boolean,
            Value::Short(_) => ScalarType::Short,
            Value::Integer(_) => ScalarType::Integer,
            Value::Long(_) => ScalarType::Long,
            Value::Byte(_) => ScalarType::Byte,
            Value::Float(_) => ScalarType::Float,
            Value::Double(_) => ScalarType::Double,
            Value::String(_) => ScalarType::String,
            Value::Char(_) => ScalarType::Char,
            Value::Decimal(_) => ScalarType::Decimal,
            Value::DateTime(_) => ScalarType::DateTime,
            Value::Date(_) => ScalarType::Date,
            Value::Time(_) => ScalarType::Time,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Char(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.3f")),
            Value::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Value::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.3f")),
        }
    }
}

/// Literal could not be converted to the requested scalar type.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("Cannot convert `{literal}` to {scalar_type}: {reason}")]
pub struct CastError {
    pub literal: String,
    pub scalar_type: ScalarType,
    pub reason: String,
}

impl CastError {
    fn new(literal: &str, scalar_type: ScalarType, reason: impl fmt::Display) -> CastError {
        CastError {
            literal: literal.to_owned(),
            scalar_type,
            reason: reason.to_string(),
        }
    }
}

fn parse<T>(literal: &str, scalar_type: ScalarType) -> Result<T, CastError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    literal
        .trim()
        .parse::<T>()
        .map_err(|err| CastError::new(literal, scalar_type, err))
}

fn parse_bool(literal: &str) -> Result<bool, CastError> {
    match literal.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" => Ok(true),
        "false" | "n" | "no" => Ok(false),
        _ => Err(CastError::new(
            literal,
            ScalarType::Boolean,
            "expected one of true/false/y/n/yes/no",
        )),
    }
}

fn parse_char(literal: &str) -> Result<char, CastError> {
    let mut chars = literal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CastError::new(
            literal,
            ScalarType::Char,
            "expected exactly one character",
        )),
    }
}

fn parse_decimal(literal: &str) -> Result<Decimal, CastError> {
    let trimmed = literal.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|err| CastError::new(literal, ScalarType::Decimal, err))
}

fn parse_date_time(literal: &str) -> Result<NaiveDateTime, CastError> {
    let trimmed = literal.trim();
    let mut last_err = None;
    for format in DATE_TIME_FORMATS {
        match NaiveDateTime::parse_from_str(trimmed, format) {
            Ok(date_time) => return Ok(date_time),
            Err(err) => last_err = Some(err),
        }
    }
    Err(CastError::new(
        literal,
        ScalarType::DateTime,
        last_err.map_or_else(String::new, |err| err.to_string()),
    ))
}

/// Converts a literal attribute (or facet, or default) value into `scalar_type`.
///
/// - [`ScalarType::String`] returns the literal verbatim, even when empty,
/// - an empty literal of any other type yields `Ok(None)`,
/// - anything else is parsed and fails with [`CastError`] when malformed.
pub fn cast_value(literal: &str, scalar_type: ScalarType) -> Result<Option<Value>, CastError> {
    if scalar_type == ScalarType::String {
        return Ok(Some(Value::String(literal.to_owned())));
    }
    if literal.is_empty() {
        return Ok(None);
    }

    let value = match scalar_type {
        ScalarType::Boolean => Value::Boolean(parse_bool(literal)?),
        ScalarType::Short => Value::Short(parse(literal, scalar_type)?),
        ScalarType::Integer => Value::Integer(parse(literal, scalar_type)?),
        ScalarType::Long => Value::Long(parse(literal, scalar_type)?),
        ScalarType::Byte => Value::Byte(parse(literal, scalar_type)?),
        ScalarType::Float => Value::Float(parse(literal, scalar_type)?),
        ScalarType::Double => Value::Double(parse(literal, scalar_type)?),
        ScalarType::String => Value::String(literal.to_owned()),
        ScalarType::Char => Value::Char(parse_char(literal)?),
        ScalarType::Decimal => Value::Decimal(parse_decimal(literal)?),
        ScalarType::DateTime => Value::DateTime(parse_date_time(literal)?),
        ScalarType::Date => Value::Date(
            NaiveDate::parse_from_str(literal.trim(), DATE_FORMAT)
                .map_err(|err| CastError::new(literal, scalar_type, err))?,
        ),
        ScalarType::Time => Value::Time(
            NaiveTime::parse_from_str(literal.trim(), TIME_FORMAT)
                .map_err(|err| CastError::new(literal, scalar_type, err))?,
        ),
    };

    Ok(Some(value))
}
