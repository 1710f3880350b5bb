//! `SQLite` storage classes to codec source values.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rusqlite::types::ValueRef;
use sqlbind::Datum;

/// Converts one column value, using the column's declared type to recover
/// booleans and timestamps that `SQLite` stores as integers and text.
pub fn to_datum(value: ValueRef<'_>, decl_type: Option<&str>) -> Datum {
    match value {
        ValueRef::Null => Datum::Null,
        ValueRef::Integer(i) if is_boolean(decl_type) => Datum::Bool(i != 0),
        ValueRef::Integer(i) => Datum::Int(i),
        ValueRef::Real(f) => Datum::Float(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) if is_timestamp(decl_type) => {
                parse_timestamp(text).map_or_else(|| Datum::Text(text.to_string()), Datum::Timestamp)
            }
            Ok(text) => Datum::Text(text.to_string()),
            Err(_) => Datum::Bytes(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Datum::Bytes(bytes.to_vec()),
    }
}

fn is_boolean(decl_type: Option<&str>) -> bool {
    decl_type.is_some_and(|t| t.eq_ignore_ascii_case("boolean") || t.eq_ignore_ascii_case("bool"))
}

fn is_timestamp(decl_type: Option<&str>) -> bool {
    decl_type.is_some_and(|t| {
        ["timestamp", "timestamptz", "datetime"].iter().any(|name| t.eq_ignore_ascii_case(name))
    })
}

// Text without an offset is UTC, matching SQLite's date functions.
fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn declared_booleans() {
        assert_eq!(to_datum(ValueRef::Integer(1), Some("BOOLEAN")), Datum::Bool(true));
        assert_eq!(to_datum(ValueRef::Integer(0), Some("bool")), Datum::Bool(false));
        assert_eq!(to_datum(ValueRef::Integer(1), Some("INTEGER")), Datum::Int(1));
        assert_eq!(to_datum(ValueRef::Integer(1), None), Datum::Int(1));
    }

    #[test]
    fn declared_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap().fixed_offset();
        let value = to_datum(ValueRef::Text(b"2024-01-15 10:30:45"), Some("DATETIME"));
        assert_eq!(value, Datum::Timestamp(expected));

        let value = to_datum(ValueRef::Text(b"2024-01-15T10:30:45Z"), Some("timestamp"));
        assert_eq!(value, Datum::Timestamp(expected));

        let value = to_datum(ValueRef::Text(b"yesterday"), Some("TIMESTAMP"));
        assert_eq!(value, Datum::Text("yesterday".to_string()));
    }

    #[test]
    fn text_and_blobs() {
        assert_eq!(to_datum(ValueRef::Text(b"abc"), Some("JSON")), Datum::Text("abc".to_string()));
        assert_eq!(to_datum(ValueRef::Text(&[0xff]), None), Datum::Bytes(vec![0xff]));
        assert_eq!(to_datum(ValueRef::Blob(&[1, 2]), None), Datum::Bytes(vec![1, 2]));
        assert_eq!(to_datum(ValueRef::Null, Some("BOOLEAN")), Datum::Null);
        assert_eq!(to_datum(ValueRef::Real(0.5), None), Datum::Float(0.5));
    }
}
