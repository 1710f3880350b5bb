//! Rendering of native values as SQL literal text.
//!
//! Encoding is a pure function of a value's runtime shape and contents: the
//! same value always renders to the same text and no database metadata is
//! consulted. All user text passes through [`quote`] (or the array element
//! escaping) before it is placed between quotes.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::array::render_array;
use crate::error::Result;
use crate::path::Accessor;
use crate::record::Record;
use crate::value::{ToSql, Value};

/// Quotes a string literal: embedded single quotes are doubled and NUL
/// characters, which SQL text cannot carry, are dropped.
///
/// ```rust
/// assert_eq!(sqlbind::quote("xi'ao'mei"), "'xi''ao''mei'");
/// assert_eq!(sqlbind::quote("a\0\0b\0c"), "'abc'");
/// ```
#[must_use]
pub fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for ch in s.chars() {
        match ch {
            '\0' => {}
            '\'' => quoted.push_str("''"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// Escapes `\`, `%` and `_` so that `s` matches literally inside a `LIKE`
/// pattern.
#[must_use]
pub fn pattern_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Renders `value` as SQL literal text.
///
/// # Errors
///
/// Returns [`crate::Error::Encode`] if a custom conversion or the JSON
/// serialization of a collection, map or record fails.
pub fn encode<T: ToSql + ?Sized>(value: &T) -> Result<String> {
    Ok(encode_value(&value.to_sql()?))
}

/// Renders an already reduced [`Value`].
#[must_use]
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null | Value::Custom(None) => "NULL".to_string(),
        Value::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Timestamp(t) => quote(&format_timestamp(t)),
        Value::Custom(Some(inner)) => {
            reduced_number(inner).map_or_else(|| encode_value(inner), ToString::to_string)
        }
        Value::Str(s) => quote(s),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::F32(v) => non_finite(f64::from(*v)).map_or_else(|| format_float32(*v), quote),
        Value::F64(v) => non_finite(*v).map_or_else(|| format_float64(*v), quote),
        Value::Array(items) => quote(&render_array(items)),
        Value::Json(doc) => quote(&doc.to_string()),
    }
}

/// Renders a collection as a quoted database array literal (`'{1,2,3}'`).
///
/// String elements use array escaping (`"` and `\` are backslash-escaped)
/// before the whole literal is quoted.
///
/// # Errors
///
/// Returns [`crate::Error::Encode`] if an element cannot be reduced.
pub fn encode_array<T: ToSql>(items: &[T]) -> Result<String> {
    let values = items.iter().map(ToSql::to_sql).collect::<Result<Vec<_>>>()?;
    Ok(quote(&render_array(&values)))
}

/// Serializes `value` as JSON and quotes the result.
///
/// # Errors
///
/// Returns [`crate::Error::Encode`] if `value` cannot be serialized.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(encode_value(&Value::json(value)?))
}

/// Renders `items` as a parenthesised, comma-separated list: `(1,2,3)`.
///
/// # Errors
///
/// Returns [`crate::Error::Encode`] if an item cannot be reduced.
pub fn encode_tuple<T: ToSql>(items: &[T]) -> Result<String> {
    let parts = items.iter().map(encode).collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(",")))
}

/// Renders each row as a tuple and joins them: `(1,'a'),(2,'b')`.
///
/// # Errors
///
/// Returns [`crate::Error::Encode`] if an item cannot be reduced.
pub fn encode_tuples<T: ToSql, R: AsRef<[T]>>(rows: &[R]) -> Result<String> {
    let tuples = rows.iter().map(|row| encode_tuple(row.as_ref())).collect::<Result<Vec<_>>>()?;
    Ok(tuples.join(","))
}

/// Renders the named fields of `record` as a tuple.
///
/// ```rust
/// sqlbind::record! {
///     #[derive(Debug, Default)]
///     pub struct Student {
///         pub id: i64,
///         pub name: String,
///     }
/// }
///
/// let student = Student { id: 1, name: "李雷".to_string() };
/// let values = sqlbind::encode_row_values(&student, &["Id", "Name"]).unwrap();
/// assert_eq!(values, "(1,'李雷')");
/// ```
///
/// # Errors
///
/// Returns [`crate::Error::NoSuchField`] or [`crate::Error::AmbiguousField`]
/// if a field path does not resolve, and [`crate::Error::Encode`] if a value
/// cannot be reduced.
pub fn encode_row_values<R: Record>(record: &R, fields: &[&str]) -> Result<String> {
    let accessors = Accessor::resolve_all::<R>(fields)?;
    row_values(record, &accessors)
}

/// Renders the named fields of each record as a tuple and joins the tuples
/// with commas, for multi-row `VALUES` lists.
///
/// # Errors
///
/// See [`encode_row_values`].
pub fn encode_bulk_rows<'a, R, I>(records: I, fields: &[&str]) -> Result<String>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let accessors = Accessor::resolve_all::<R>(fields)?;
    let rows =
        records.into_iter().map(|r| row_values(r, &accessors)).collect::<Result<Vec<_>>>()?;
    Ok(rows.join(","))
}

/// Renders one field of every record as a tuple, for `IN` lists.
///
/// # Errors
///
/// See [`encode_row_values`].
pub fn encode_field_values<'a, R, I>(records: I, field: &str) -> Result<String>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let accessor = Accessor::parse::<R>(field)?;
    let parts = records
        .into_iter()
        .map(|r| accessor.read(r).and_then(encode))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(",")))
}

fn row_values<R: Record>(record: &R, accessors: &[Accessor]) -> Result<String> {
    let parts =
        accessors.iter().map(|a| a.read(record).and_then(encode)).collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(",")))
}

/// Text of a custom reduction that is emitted bare because it reads as a
/// finite number (e.g. a decimal reducing to `"12.34"`).
pub(crate) fn reduced_number(value: &Value) -> Option<&str> {
    match value {
        Value::Str(s) if s.parse::<f64>().is_ok_and(f64::is_finite) => Some(s),
        _ => None,
    }
}

pub(crate) fn non_finite(v: f64) -> Option<&'static str> {
    if v.is_nan() {
        Some("NaN")
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}

// Shortest round-trip digits; exponent form outside [1e-5, 1e16).
pub(crate) fn format_float64(v: f64) -> String {
    let abs = v.abs();
    if abs != 0.0 && !(1e-5..1e16).contains(&abs) { format!("{v:e}") } else { v.to_string() }
}

pub(crate) fn format_float32(v: f32) -> String {
    let abs = v.abs();
    if abs != 0.0 && !(1e-5..1e16).contains(&abs) { format!("{v:e}") } else { v.to_string() }
}

/// `2006-01-02T15:04:05.999999Z07:00`: microseconds with trailing zeros
/// trimmed, `Z` for a zero offset.
pub(crate) fn format_timestamp(t: &DateTime<FixedOffset>) -> String {
    let mut text = t.format("%Y-%m-%dT%H:%M:%S").to_string();
    push_micros(&mut text, t.nanosecond());
    if t.offset().local_minus_utc() == 0 {
        text.push('Z');
    } else {
        text.push_str(&t.format("%:z").to_string());
    }
    text
}

pub(crate) fn format_naive_timestamp(t: &NaiveDateTime) -> String {
    let mut text = t.format("%Y-%m-%d %H:%M:%S").to_string();
    push_micros(&mut text, t.nanosecond());
    text
}

fn push_micros(text: &mut String, nanos: u32) {
    // leap seconds carry nanos >= 1e9
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros > 0 {
        let fraction = format!(".{micros:06}");
        text.push_str(fraction.trim_end_matches('0'));
    }
}
