//! Result-set metadata, source values and the cursor contract.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::naming::column_to_field_path;

/// Metadata for one result-set column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Zero-based position of the column in each row.
    pub position: usize,
    /// Column alias as reported by the database.
    pub name: String,
    /// Declared database type name, when the driver reports one.
    pub db_type: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a descriptor without a declared type.
    #[must_use]
    pub fn new(position: usize, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
            db_type: None,
        }
    }

    /// Sets the declared database type.
    #[must_use]
    pub fn with_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }

    /// Field identifiers addressed by this column (`profile.user_name` →
    /// `["Profile", "UserName"]`).
    #[must_use]
    pub fn field_path(&self) -> Vec<String> {
        column_to_field_path(&self.name)
    }

    /// Whether the declared type is `JSON` or `JSONB`.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.db_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("json") || t.eq_ignore_ascii_case("jsonb"))
    }

    /// Whether the declared type names an array type. Array type names carry
    /// a leading underscore (`_int4`, `_text`).
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.db_type.as_deref().is_some_and(|t| t.starts_with('_'))
    }
}

/// A column value as delivered by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Datum {
    /// SQL `NULL`.
    #[default]
    Null,
    /// Any integer column.
    Int(i64),
    /// Any floating point column.
    Float(f64),
    /// Boolean column.
    Bool(bool),
    /// Raw bytes (binary columns, or text the driver did not decode).
    Bytes(Vec<u8>),
    /// Text column.
    Text(String),
    /// Timestamp with offset.
    Timestamp(DateTime<FixedOffset>),
    /// Already-parsed JSON document.
    Json(serde_json::Value),
}

impl Datum {
    /// Whether this is SQL `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Source type name and value, used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(v) => write!(f, "int64({v})"),
            Self::Float(v) => write!(f, "float64({v})"),
            Self::Bool(v) => write!(f, "bool({v})"),
            Self::Bytes(v) => write!(f, "bytes({:?})", String::from_utf8_lossy(v)),
            Self::Text(v) => write!(f, "text({v:?})"),
            Self::Timestamp(v) => write!(f, "timestamp({})", v.to_rfc3339()),
            Self::Json(v) => write!(f, "json({v})"),
        }
    }
}

/// Pull-style access to a query result.
///
/// Columns are fixed for the lifetime of the result set. Each call to
/// [`Cursor::next_row`] advances one row and returns its values in column
/// order, or `None` once rows are exhausted.
pub trait Cursor {
    /// Column descriptors, in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot describe the result set.
    fn columns(&self) -> anyhow::Result<Vec<ColumnDescriptor>>;

    /// Advances to the next row and returns its values.
    ///
    /// # Errors
    ///
    /// Returns any I/O or protocol error raised by the driver.
    fn next_row(&mut self) -> anyhow::Result<Option<Vec<Datum>>>;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn columns(&self) -> anyhow::Result<Vec<ColumnDescriptor>> {
        (**self).columns()
    }

    fn next_row(&mut self) -> anyhow::Result<Option<Vec<Datum>>> {
        (**self).next_row()
    }
}

/// A cursor over rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<ColumnDescriptor>,
    rows: VecDeque<Vec<Datum>>,
}

impl MemoryCursor {
    /// Creates a cursor with the given columns and no rows.
    #[must_use]
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: VecDeque::new(),
        }
    }

    /// Creates a cursor whose columns are untyped and named by `names`.
    #[must_use]
    pub fn with_names(names: &[&str]) -> Self {
        let columns =
            names.iter().enumerate().map(|(i, name)| ColumnDescriptor::new(i, *name)).collect();
        Self::new(columns)
    }

    /// Appends a row.
    #[must_use]
    pub fn row(mut self, values: Vec<Datum>) -> Self {
        self.rows.push_back(values);
        self
    }

    /// Appends a row.
    pub fn push(&mut self, values: Vec<Datum>) {
        self.rows.push_back(values);
    }
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> anyhow::Result<Vec<ColumnDescriptor>> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> anyhow::Result<Option<Vec<Datum>>> {
        Ok(self.rows.pop_front())
    }
}
