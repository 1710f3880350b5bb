//! Encodable values.
//!
//! [`Value`] is the closed set of shapes the encoder understands. Native types
//! reach it through [`ToSql`]; adding a new native shape means adding a
//! variant here, which every dispatch site then has to handle.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;

use crate::error::{Error, Result};

/// A native value reduced to an encodable shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value, rendered as `NULL`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// 8-bit signed integer.
    I8(i8),
    /// 16-bit signed integer.
    I16(i16),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 8-bit unsigned integer.
    U8(u8),
    /// 16-bit unsigned integer.
    U16(u16),
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit unsigned integer.
    U64(u64),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
    /// Text, quoted on output.
    Str(String),
    /// Bytes that already hold SQL text; emitted verbatim.
    Raw(Vec<u8>),
    /// Timestamp with offset, microsecond precision on output.
    Timestamp(DateTime<FixedOffset>),
    /// Reduction of a custom-convertible type. `None` is an absent value.
    Custom(Option<Box<Self>>),
    /// Database array.
    Array(Vec<Self>),
    /// Collections, maps and records, serialized as JSON.
    Json(serde_json::Value),
}

impl Value {
    /// Wraps the driver-level reduction of a custom-convertible type.
    #[must_use]
    pub fn custom(reduced: Option<Self>) -> Self {
        Self::Custom(reduced.map(Box::new))
    }

    /// Serializes `value` into a [`Value::Json`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value).map(Self::Json).map_err(|e| Error::Encode(e.to_string()))
    }
}

/// Types that can be rendered as SQL literals.
///
/// Implement this for custom-convertible types by reducing to a driver
/// primitive and wrapping it with [`Value::custom`]:
///
/// ```rust
/// use sqlbind::{ToSql, Value};
///
/// struct Cents(i64);
///
/// impl ToSql for Cents {
///     fn to_sql(&self) -> sqlbind::Result<Value> {
///         let text = format!("{}.{:02}", self.0 / 100, self.0 % 100);
///         Ok(Value::custom(Some(Value::Str(text))))
///     }
/// }
///
/// assert_eq!(sqlbind::encode(&Cents(1234)).unwrap(), "12.34");
/// ```
pub trait ToSql {
    /// Reduces `self` to an encodable [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the value cannot be reduced.
    fn to_sql(&self) -> Result<Value>;
}

macro_rules! to_sql_copy {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> Result<Value> {
                    Ok(Value::$variant(*self))
                }
            }
        )*
    };
}

to_sql_copy! {
    bool => Bool,
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
}

impl ToSql for isize {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::I64(*self as i64))
    }
}

impl ToSql for usize {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::U64(*self as u64))
    }
}

impl ToSql for str {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Str(self.to_owned()))
    }
}

impl ToSql for String {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Str(self.clone()))
    }
}

impl ToSql for char {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Str(self.to_string()))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> Result<Value> {
        (**self).to_sql()
    }
}

impl<T: ToSql + ?Sized> ToSql for Box<T> {
    fn to_sql(&self) -> Result<Value> {
        (**self).to_sql()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> Result<Value> {
        self.as_ref().map_or(Ok(Value::Null), ToSql::to_sql)
    }
}

impl<Tz: TimeZone> ToSql for DateTime<Tz> {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Timestamp(self.fixed_offset()))
    }
}

impl ToSql for NaiveDateTime {
    fn to_sql(&self) -> Result<Value> {
        let text = crate::encode::format_naive_timestamp(self);
        Ok(Value::custom(Some(Value::Str(text))))
    }
}

impl ToSql for NaiveDate {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::custom(Some(Value::Str(self.format("%Y-%m-%d").to_string()))))
    }
}

impl ToSql for NaiveTime {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::custom(Some(Value::Str(self.format("%H:%M:%S%.6f").to_string()))))
    }
}

impl ToSql for serde_json::Value {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Json(self.clone()))
    }
}

/// Element types of encodable collections.
///
/// Collections encode as quoted JSON, except byte vectors, which hold raw
/// SQL text. Serializable types opt in with an empty impl:
///
/// ```rust
/// #[derive(serde::Serialize)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl sqlbind::SqlElement for Point {}
///
/// let points = vec![Point { x: 1, y: 2 }];
/// assert_eq!(sqlbind::encode(&points).unwrap(), r#"'[{"x":1,"y":2}]'"#);
/// ```
pub trait SqlElement: Serialize {
    /// Raw SQL text held by a collection of this element type.
    fn to_blob(_items: &[Self]) -> Option<Vec<u8>>
    where
        Self: Sized,
    {
        None
    }
}

impl SqlElement for u8 {
    fn to_blob(items: &[Self]) -> Option<Vec<u8>> {
        Some(items.to_vec())
    }
}

macro_rules! sql_element {
    ($($ty:ty),* $(,)?) => {
        $(impl SqlElement for $ty {})*
    };
}

sql_element! {
    bool, char, i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, f32, f64,
    str, String, serde_json::Value, NaiveDate, NaiveDateTime, NaiveTime,
}

impl<Tz: TimeZone> SqlElement for DateTime<Tz> where Self: Serialize {}
impl<T: SqlElement + ?Sized> SqlElement for &T {}
impl<T: SqlElement + ?Sized> SqlElement for Box<T> {}
impl<T: SqlElement> SqlElement for Option<T> {}
impl<T: SqlElement> SqlElement for [T] {}
impl<T: SqlElement> SqlElement for Vec<T> {}
impl<T: SqlElement, const N: usize> SqlElement for [T; N] where [T; N]: Serialize {}
impl<K: Serialize, V: Serialize, S> SqlElement for HashMap<K, V, S> where Self: Serialize {}
impl<K: Serialize, V: Serialize> SqlElement for BTreeMap<K, V> {}
impl<T: Serialize> SqlElement for Json<T> {}

macro_rules! sql_element_tuple {
    ($(($($name:ident),+)),* $(,)?) => {
        $(impl<$($name: SqlElement),+> SqlElement for ($($name,)+) {})*
    };
}

sql_element_tuple! {
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
}

// Byte vectors are raw SQL text; every other element type is a JSON array.
impl<T: SqlElement> ToSql for [T] {
    fn to_sql(&self) -> Result<Value> {
        match T::to_blob(self) {
            Some(bytes) => Ok(Value::Raw(bytes)),
            None => Value::json(self),
        }
    }
}

impl<T: SqlElement> ToSql for Vec<T> {
    fn to_sql(&self) -> Result<Value> {
        self.as_slice().to_sql()
    }
}

impl<K: Serialize, V: Serialize, S> ToSql for HashMap<K, V, S> {
    fn to_sql(&self) -> Result<Value> {
        Value::json(self)
    }
}

impl<K: Serialize, V: Serialize> ToSql for BTreeMap<K, V> {
    fn to_sql(&self) -> Result<Value> {
        Value::json(self)
    }
}

/// Bytes holding SQL text that is emitted without quoting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raw(pub Vec<u8>);

impl From<&str> for Raw {
    fn from(sql: &str) -> Self {
        Self(sql.as_bytes().to_vec())
    }
}

impl ToSql for Raw {
    fn to_sql(&self) -> Result<Value> {
        Ok(Value::Raw(self.0.clone()))
    }
}

/// A value stored as JSON.
///
/// Encodes as quoted JSON text and always decodes its column as JSON,
/// whatever type the database declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToSql for Json<T> {
    fn to_sql(&self) -> Result<Value> {
        Value::json(&self.0)
    }
}

/// A collection stored as a database array (`'{1,2,3}'`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Array<T>(pub Vec<T>);

impl<T: ToSql> ToSql for Array<T> {
    fn to_sql(&self) -> Result<Value> {
        self.0.iter().map(ToSql::to_sql).collect::<Result<Vec<_>>>().map(Value::Array)
    }
}
