//! Column scanners.
//!
//! Every destination leaf implements [`Scan`]. For each column a [`Scanner`]
//! is selected once, from the leaf's custom hook flag and the column's
//! declared type, and then applied to that column's value in every row.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::array::parse_array;
use crate::column::{ColumnDescriptor, Datum};
use crate::encode::format_timestamp;
use crate::error::{Error, Result};
use crate::value::{Array, Json};

/// A destination leaf that can receive a single column value.
///
/// Implementations never see `NULL`: the selected [`Scanner`] turns a null
/// source into a call to [`Scan::reset`].
pub trait Scan {
    /// Assigns a non-null source value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] or [`Error::OutOfRange`] if the value
    /// cannot be coerced into the destination.
    fn scan(&mut self, src: Datum) -> Result<()>;

    /// Decodes a JSON payload into the destination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload does not match the destination.
    fn scan_json(&mut self, payload: &[u8]) -> Result<()>;

    /// Decodes a database array literal into the destination.
    ///
    /// # Errors
    ///
    /// The default rejects every literal with [`Error::TypeMismatch`].
    fn scan_array(&mut self, literal: &str) -> Result<()> {
        Err(Error::TypeMismatch {
            src: format!("array({literal:?})"),
            dest: self.type_name(),
        })
    }

    /// Resets the destination to its zero value.
    fn reset(&mut self);

    /// Whether the destination decodes itself whatever the column's declared
    /// type.
    fn custom(&self) -> bool {
        false
    }

    /// Destination type name, used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Decode strategy bound to one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanner {
    /// Type-directed coercion.
    Basic,
    /// JSON decode of the column's text or bytes.
    Json,
    /// Database array literal decode.
    Array,
    /// The destination's own decode hook.
    Custom,
}

impl Scanner {
    /// Selects the scanner for `dest` and `column`.
    #[must_use]
    pub fn select(dest: &dyn Scan, column: &ColumnDescriptor) -> Self {
        if dest.custom() {
            Self::Custom
        } else if column.is_json() {
            Self::Json
        } else if column.is_array() {
            Self::Array
        } else {
            Self::Basic
        }
    }

    /// Applies this scanner to one column value.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the destination, or
    /// [`Error::TypeMismatch`] if a JSON or array column delivers a value
    /// that is neither text nor bytes.
    pub fn scan(self, dest: &mut dyn Scan, src: Datum) -> Result<()> {
        match (self, src) {
            (_, Datum::Null) => {
                dest.reset();
                Ok(())
            }
            (Self::Basic | Self::Custom, src) => dest.scan(src),
            (Self::Json, Datum::Text(text)) => dest.scan_json(text.as_bytes()),
            (Self::Json, Datum::Bytes(bytes)) => dest.scan_json(&bytes),
            (Self::Json, Datum::Json(doc)) => dest.scan_json(&serde_json::to_vec(&doc)?),
            (Self::Array, Datum::Text(text)) => dest.scan_array(&text),
            (Self::Array, Datum::Bytes(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => dest.scan_array(&text),
                Err(e) => Err(Error::TypeMismatch {
                    src: Datum::Bytes(e.into_bytes()).describe(),
                    dest: dest.type_name(),
                }),
            },
            (Self::Json | Self::Array, src) => Err(Error::TypeMismatch {
                src: src.describe(),
                dest: dest.type_name(),
            }),
        }
    }
}

fn json_into<T: DeserializeOwned>(slot: &mut T, payload: &[u8]) -> Result<()> {
    *slot = serde_json::from_slice(payload)?;
    Ok(())
}

macro_rules! scan_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scan for $ty {
                fn scan(&mut self, src: Datum) -> Result<()> {
                    let &Datum::Int(wide) = &src else {
                        return Err(Error::mismatch::<$ty>(src.describe()));
                    };
                    *self = <$ty>::try_from(wide)
                        .ok()
                        .ok_or_else(|| Error::out_of_range::<$ty>(src.describe()))?;
                    Ok(())
                }

                fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
                    json_into(self, payload)
                }

                fn reset(&mut self) {
                    *self = 0;
                }
            }
        )*
    };
}

scan_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// Float text is parsed at the destination's own width.
fn float_text<F: FromStr>(src: &Datum) -> Option<F> {
    let text = match src {
        Datum::Text(text) => text.as_str(),
        Datum::Bytes(bytes) => std::str::from_utf8(bytes).ok()?,
        _ => return None,
    };
    text.trim().parse().ok()
}

impl Scan for f64 {
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = match src {
            Datum::Float(v) => v,
            other => float_text(&other).ok_or_else(|| Error::mismatch::<Self>(other.describe()))?,
        };
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = 0.0;
    }
}

impl Scan for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = match src {
            Datum::Float(wide) => {
                let narrow = wide as Self;
                if !(wide.is_nan() || f64::from(narrow) == wide) {
                    return Err(Error::out_of_range::<Self>(Datum::Float(wide).describe()));
                }
                narrow
            }
            other => float_text(&other).ok_or_else(|| Error::mismatch::<Self>(other.describe()))?,
        };
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = 0.0;
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl Scan for bool {
    fn scan(&mut self, src: Datum) -> Result<()> {
        let &Datum::Bool(value) = &src else {
            return Err(Error::mismatch::<Self>(src.describe()));
        };
        *self = value;
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = false;
    }
}

impl Scan for String {
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = match src {
            Datum::Text(text) => text,
            Datum::Bytes(bytes) => String::from_utf8(bytes).map_err(|e| {
                Error::mismatch::<Self>(Datum::Bytes(e.into_bytes()).describe())
            })?,
            other => return Err(Error::mismatch::<Self>(other.describe())),
        };
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Parses RFC 3339 text, or `YYYY-MM-DD HH:MM:SS[.ffffff]` read as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t);
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

fn timestamp_source(src: &Datum) -> Option<DateTime<FixedOffset>> {
    match src {
        Datum::Timestamp(t) => Some(*t),
        Datum::Text(text) => parse_timestamp(text),
        _ => None,
    }
}

impl Scan for DateTime<FixedOffset> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = timestamp_source(&src).ok_or_else(|| Error::mismatch::<Self>(src.describe()))?;
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Scan for DateTime<Utc> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        let t = timestamp_source(&src).ok_or_else(|| Error::mismatch::<Self>(src.describe()))?;
        *self = t.with_timezone(&Utc);
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Scan for NaiveDateTime {
    fn scan(&mut self, src: Datum) -> Result<()> {
        let t = timestamp_source(&src).ok_or_else(|| Error::mismatch::<Self>(src.describe()))?;
        *self = t.naive_local();
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

// Dates decode themselves: a date column may arrive as a timestamp or as
// `YYYY-MM-DD` text under any declared type.
impl Scan for NaiveDate {
    fn scan(&mut self, src: Datum) -> Result<()> {
        let date = match &src {
            Datum::Text(text) => Self::parse_from_str(text.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(text).map(|t| t.date_naive())),
            other => timestamp_source(other).map(|t| t.date_naive()),
        };
        *self = date.ok_or_else(|| Error::mismatch::<Self>(src.describe()))?;
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn custom(&self) -> bool {
        true
    }
}

/// Converts a source value into a dynamic JSON value. Bytes become base64
/// text and timestamps their literal text.
pub(crate) fn datum_to_json(src: Datum) -> serde_json::Value {
    use serde_json::Value;

    match src {
        Datum::Null => Value::Null,
        Datum::Int(v) => Value::from(v),
        Datum::Float(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        Datum::Bool(v) => Value::Bool(v),
        Datum::Bytes(bytes) => Value::String(Base64::encode_string(&bytes)),
        Datum::Text(text) => Value::String(text),
        Datum::Timestamp(t) => Value::String(format_timestamp(&t)),
        Datum::Json(doc) => doc,
    }
}

impl Scan for serde_json::Value {
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = datum_to_json(src);
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        let elements = parse_array::<Self>(literal)?;
        *self = Self::Array(
            elements.into_iter().map(|e| e.map_or(Self::Null, Self::String)).collect(),
        );
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::Null;
    }
}

impl Scan for Datum {
    fn scan(&mut self, src: Datum) -> Result<()> {
        *self = match src {
            Self::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Self::Text(text),
                Err(e) => Self::Bytes(e.into_bytes()),
            },
            other => other,
        };
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        *self = Self::Json(serde_json::from_slice(payload)?);
        Ok(())
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        *self = Self::Text(literal.to_string());
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::Null;
    }
}

impl<T: DeserializeOwned + Default> Scan for Json<T> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        self.0 = match src {
            Datum::Text(text) => serde_json::from_str(&text)?,
            Datum::Bytes(bytes) => serde_json::from_slice(&bytes)?,
            other => serde_json::from_value(datum_to_json(other))?,
        };
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(&mut self.0, payload)
    }

    fn reset(&mut self) {
        self.0 = T::default();
    }

    fn custom(&self) -> bool {
        true
    }
}

/// Element types of collection destinations.
///
/// Elements decode from database array literals one item at a time and
/// from JSON payloads as a whole. Byte vectors are the exception: they hold
/// the column's raw bytes.
pub trait Element: Sized + Default + Serialize + DeserializeOwned {
    /// Parses one non-null array element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] or [`Error::OutOfRange`] if `text`
    /// is not a valid element.
    fn from_text(text: &str) -> Result<Self>;

    /// Takes a raw column value as a whole collection, for element types
    /// that store bytes.
    fn from_blob(_bytes: Vec<u8>) -> Option<Vec<Self>> {
        None
    }
}

fn element_source(text: &str) -> String {
    Datum::Text(text.to_string()).describe()
}

fn int_element<T: TryFrom<i128>>(text: &str) -> Result<T> {
    let wide = text
        .trim()
        .parse::<i128>()
        .ok()
        .ok_or_else(|| Error::mismatch::<T>(element_source(text)))?;
    T::try_from(wide).ok().ok_or_else(|| Error::out_of_range::<T>(element_source(text)))
}

macro_rules! element_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                fn from_text(text: &str) -> Result<Self> {
                    int_element(text)
                }
            }
        )*
    };
}

element_int!(i8, i16, i32, i64, u16, u32, u64);

impl Element for u8 {
    fn from_text(text: &str) -> Result<Self> {
        int_element(text)
    }

    fn from_blob(bytes: Vec<u8>) -> Option<Vec<Self>> {
        Some(bytes)
    }
}

impl Element for f64 {
    fn from_text(text: &str) -> Result<Self> {
        text.trim().parse().ok().ok_or_else(|| Error::mismatch::<Self>(element_source(text)))
    }
}

impl Element for f32 {
    fn from_text(text: &str) -> Result<Self> {
        text.trim().parse().ok().ok_or_else(|| Error::mismatch::<Self>(element_source(text)))
    }
}

impl Element for bool {
    fn from_text(text: &str) -> Result<Self> {
        parse_bool(text).ok_or_else(|| Error::mismatch::<Self>(element_source(text)))
    }
}

impl Element for String {
    fn from_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

impl Element for serde_json::Value {
    fn from_text(text: &str) -> Result<Self> {
        Ok(Self::String(text.to_string()))
    }
}

impl<T: Element> Element for Option<T> {
    fn from_text(text: &str) -> Result<Self> {
        T::from_text(text).map(Some)
    }
}

fn parse_elements<T: Element, D: ?Sized>(literal: &str) -> Result<Vec<T>> {
    parse_array::<D>(literal)?
        .into_iter()
        .map(|element| element.map_or_else(|| Ok(T::default()), |text| T::from_text(&text)))
        .collect()
}

impl<T: Element> Scan for Vec<T> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        let items = match src {
            Datum::Bytes(bytes) => T::from_blob(bytes),
            Datum::Text(text) => T::from_blob(text.into_bytes()),
            other => return Err(Error::mismatch::<Self>(other.describe())),
        };
        *self = items.ok_or_else(|| Error::mismatch::<Self>("bytes"))?;
        Ok(())
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(self, payload)
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        *self = parse_elements::<T, Self>(literal)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.clear();
    }
}

impl<T: Element> Scan for Array<T> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        match src {
            Datum::Text(text) => self.scan_array(&text),
            Datum::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => self.scan_array(&text),
                Err(e) => Err(Error::mismatch::<Self>(Datum::Bytes(e.into_bytes()).describe())),
            },
            other => Err(Error::mismatch::<Self>(other.describe())),
        }
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        json_into(&mut self.0, payload)
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        self.0 = parse_elements::<T, Self>(literal)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.0.clear();
    }

    fn custom(&self) -> bool {
        true
    }
}

macro_rules! scan_json_map {
    ($($map:ident),*) => {
        $(
            impl<V: DeserializeOwned> Scan for $map<String, V> {
                fn scan(&mut self, src: Datum) -> Result<()> {
                    match src {
                        Datum::Text(text) => self.scan_json(text.as_bytes()),
                        Datum::Bytes(bytes) => self.scan_json(&bytes),
                        Datum::Json(doc) => {
                            *self = serde_json::from_value(doc)?;
                            Ok(())
                        }
                        other => Err(Error::mismatch::<Self>(other.describe())),
                    }
                }

                fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
                    json_into(self, payload)
                }

                fn reset(&mut self) {
                    self.clear();
                }
            }
        )*
    };
}

scan_json_map!(HashMap, BTreeMap);

// Scans into the existing value, or into a fresh one that is stored only
// once the scan succeeds.
fn fill<T, F>(slot: &mut Option<T>, scan: F) -> Result<()>
where
    T: Default,
    F: FnOnce(&mut T) -> Result<()>,
{
    if let Some(inner) = slot {
        return scan(inner);
    }
    let mut inner = T::default();
    scan(&mut inner)?;
    *slot = Some(inner);
    Ok(())
}

// The outermost `Option` stays `None` for a null source; any other value
// allocates the inner destination once.
impl<T: Scan + Default> Scan for Option<T> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        fill(self, |inner| inner.scan(src))
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        if payload.trim_ascii() == b"null" {
            *self = None;
            return Ok(());
        }
        fill(self, |inner| inner.scan_json(payload))
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        fill(self, |inner| inner.scan_array(literal))
    }

    fn reset(&mut self) {
        *self = None;
    }

    fn custom(&self) -> bool {
        self.as_ref().map_or_else(|| T::default().custom(), Scan::custom)
    }
}

impl<T: Scan + ?Sized> Scan for Box<T> {
    fn scan(&mut self, src: Datum) -> Result<()> {
        (**self).scan(src)
    }

    fn scan_json(&mut self, payload: &[u8]) -> Result<()> {
        (**self).scan_json(payload)
    }

    fn scan_array(&mut self, literal: &str) -> Result<()> {
        (**self).scan_array(literal)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn custom(&self) -> bool {
        (**self).custom()
    }

    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }
}
