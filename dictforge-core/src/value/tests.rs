use std::str::FromStr;

use assert_matches::assert_matches;

use super::*;

#[test]
fn string_is_returned_verbatim() {
    assert_eq!(
        cast_value(" padded ", ScalarType::String).unwrap(),
        Some(Value::String(" padded ".into()))
    );
    assert_eq!(
        cast_value("", ScalarType::String).unwrap(),
        Some(Value::String(String::new()))
    );
}

#[test]
fn empty_literal_is_none() {
    for scalar_type in ScalarType::ALL {
        if scalar_type != ScalarType::String {
            assert_eq!(cast_value("", scalar_type).unwrap(), None, "{scalar_type}");
        }
    }
}

#[test]
fn cast_numbers() {
    assert_eq!(cast_value("-7", ScalarType::Short).unwrap(), Some(Value::Short(-7)));
    assert_eq!(cast_value("42", ScalarType::Integer).unwrap(), Some(Value::Integer(42)));
    assert_eq!(
        cast_value("9000000000", ScalarType::Long).unwrap(),
        Some(Value::Long(9_000_000_000))
    );
    assert_eq!(cast_value("127", ScalarType::Byte).unwrap(), Some(Value::Byte(127)));
    assert_eq!(cast_value("1.5", ScalarType::Float).unwrap(), Some(Value::Float(1.5)));
    assert_eq!(cast_value("2.25", ScalarType::Double).unwrap(), Some(Value::Double(2.25)));
    assert_eq!(
        cast_value("10.0001", ScalarType::Decimal).unwrap(),
        Some(Value::Decimal(Decimal::from_str("10.0001").unwrap()))
    );
}

#[test]
fn cast_out_of_range_fails() {
    assert_matches!(
        cast_value("128", ScalarType::Byte),
        Err(CastError { scalar_type: ScalarType::Byte, .. })
    );
    assert_matches!(
        cast_value("4.2", ScalarType::Integer),
        Err(CastError { scalar_type: ScalarType::Integer, literal, .. }) if literal == "4.2"
    );
}

#[test]
fn cast_booleans() {
    for literal in ["true", "TRUE", "y", "Yes"] {
        assert_eq!(
            cast_value(literal, ScalarType::Boolean).unwrap(),
            Some(Value::Boolean(true)),
            "{literal}"
        );
    }
    for literal in ["false", "N", "no"] {
        assert_eq!(
            cast_value(literal, ScalarType::Boolean).unwrap(),
            Some(Value::Boolean(false)),
            "{literal}"
        );
    }
    assert!(cast_value("maybe", ScalarType::Boolean).is_err());
}

#[test]
fn cast_chars() {
    assert_eq!(cast_value("A", ScalarType::Char).unwrap(), Some(Value::Char('A')));
    assert_eq!(cast_value("ł", ScalarType::Char).unwrap(), Some(Value::Char('ł')));
    assert!(cast_value("AB", ScalarType::Char).is_err());
}

#[test]
fn cast_temporal_values() {
    assert_eq!(
        cast_value("2024-01-31", ScalarType::Date).unwrap(),
        Some(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()))
    );
    assert_eq!(
        cast_value("12:30:05", ScalarType::Time).unwrap(),
        Some(Value::Time(NaiveTime::from_hms_opt(12, 30, 5).unwrap()))
    );
    assert_eq!(
        cast_value("12:30:05.250", ScalarType::Time).unwrap(),
        Some(Value::Time(NaiveTime::from_hms_milli_opt(12, 30, 5, 250).unwrap()))
    );
    let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
        .unwrap()
        .and_hms_milli_opt(12, 30, 5, 100)
        .unwrap();
    assert_eq!(
        cast_value("2024-01-31T12:30:05.100", ScalarType::DateTime).unwrap(),
        Some(Value::DateTime(expected))
    );
    assert_eq!(
        cast_value("2024-01-31 12:30:05.100", ScalarType::DateTime).unwrap(),
        Some(Value::DateTime(expected))
    );
    assert!(cast_value("31/01/2024", ScalarType::Date).is_err());
    assert!(cast_value("2024-01-31", ScalarType::DateTime).is_err());
}

#[test]
fn value_reports_its_type() {
    let value = cast_value("3", ScalarType::Long).unwrap().unwrap();
    assert_eq!(value.scalar_type(), ScalarType::Long);
    assert_eq!(value.to_string(), "3");
}
