//! Decoding result sets into destinations.
//!
//! The destination's shape decides how rows are consumed:
//!
//! - scalars and records read at most one row; no rows leaves them untouched,
//! - `Vec<T>` appends one element per row, in row order,
//! - `HashMap` and `BTreeMap` keyed by field name take every column of every
//!   row, later rows overwriting earlier keys.

use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;

use crate::column::{ColumnDescriptor, Cursor, Datum};
use crate::error::{Error, Result};
use crate::path::Accessor;
use crate::record::Record;
use crate::scan::{Element, Scan, Scanner};
use crate::value::{Array, Json};

/// Decodes every row `cursor` yields into `dest`.
///
/// ```rust
/// use sqlbind::{Datum, MemoryCursor};
///
/// let mut cursor = MemoryCursor::with_names(&["n"])
///     .row(vec![Datum::Int(1)])
///     .row(vec![Datum::Null])
///     .row(vec![Datum::Int(3)]);
///
/// let mut numbers: Vec<i32> = Vec::new();
/// sqlbind::decode(&mut cursor, &mut numbers).unwrap();
/// assert_eq!(numbers, [1, 0, 3]);
/// ```
///
/// # Errors
///
/// Returns [`Error::NoColumns`] for a result set without columns,
/// [`Error::Cursor`] for any cursor failure, and the field or conversion
/// error of the first column that cannot be decoded. Rows decoded before an
/// error stay in `dest`.
pub fn decode<C, D>(cursor: &mut C, dest: &mut D) -> Result<()>
where
    C: Cursor + ?Sized,
    D: Destination + ?Sized,
{
    let columns = cursor.columns().map_err(Error::Cursor)?;
    if columns.is_empty() {
        return Err(Error::NoColumns);
    }
    tracing::trace!(
        columns = columns.len(),
        destination = std::any::type_name::<D>(),
        "decoding result set"
    );

    let rows = dest.decode_rows(&columns, cursor)?;
    tracing::debug!(rows, "decoded result set");
    Ok(())
}

/// A value a whole result set decodes into.
pub trait Destination {
    /// Consumes rows from `cursor` and returns how many were decoded.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while planning or decoding.
    fn decode_rows<C: Cursor + ?Sized>(
        &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
    ) -> Result<usize>;
}

/// A value a single row decodes into.
///
/// Column handling is planned once per result set and reused for every row.
pub trait FromRow: Default {
    /// Per-column decode plan.
    type Plan;

    /// Plans decoding of rows with `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`], [`Error::NoSuchField`] or
    /// [`Error::AmbiguousField`] if the columns do not fit this type.
    fn plan(columns: &[ColumnDescriptor]) -> Result<Self::Plan>;

    /// Decodes one row's values.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    fn scan_row(&mut self, plan: &Self::Plan, values: Vec<Datum>) -> Result<()>;
}

fn next_row<C: Cursor + ?Sized>(cursor: &mut C) -> Result<Option<Vec<Datum>>> {
    cursor.next_row().map_err(Error::Cursor)
}

fn check_width(values: &[Datum], expected: usize) -> Result<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(Error::Cursor(anyhow!("row has {} values for {expected} columns", values.len())))
    }
}

/// Reads at most one row into `dest`.
#[doc(hidden)]
pub fn single_row<T: FromRow, C: Cursor + ?Sized>(
    dest: &mut T, columns: &[ColumnDescriptor], cursor: &mut C,
) -> Result<usize> {
    let plan = T::plan(columns)?;
    match next_row(cursor)? {
        Some(values) => {
            dest.scan_row(&plan, values)?;
            Ok(1)
        }
        None => Ok(0),
    }
}

/// Plan for a single-column destination.
fn scalar_plan<T: Scan + Default>(columns: &[ColumnDescriptor]) -> Result<Scanner> {
    match columns {
        [column] => Ok(Scanner::select(&T::default(), column)),
        _ => Err(Error::Shape(format!(
            "{} needs exactly one column, result set has {}",
            std::any::type_name::<T>(),
            columns.len()
        ))),
    }
}

fn scalar_row<T: Scan>(dest: &mut T, scanner: Scanner, values: Vec<Datum>) -> Result<()> {
    check_width(&values, 1)?;
    let value = values.into_iter().next().unwrap_or(Datum::Null);
    scanner.scan(dest, value)
}

macro_rules! scalar_destination {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                type Plan = Scanner;

                fn plan(columns: &[ColumnDescriptor]) -> Result<Scanner> {
                    scalar_plan::<Self>(columns)
                }

                fn scan_row(&mut self, plan: &Scanner, values: Vec<Datum>) -> Result<()> {
                    scalar_row(self, *plan, values)
                }
            }

            impl Destination for $ty {
                fn decode_rows<C: Cursor + ?Sized>(
                    &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
                ) -> Result<usize> {
                    single_row(self, columns, cursor)
                }
            }
        )*
    };
}

scalar_destination! {
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String,
    DateTime<Utc>, DateTime<FixedOffset>, NaiveDateTime, NaiveDate,
    serde_json::Value, Datum,
}

macro_rules! generic_scalar_destination {
    ($($ty:ident<$param:ident: $($bound:path)|+>),* $(,)?) => {
        $(
            impl<$param: $($bound +)+> FromRow for $ty<$param> {
                type Plan = Scanner;

                fn plan(columns: &[ColumnDescriptor]) -> Result<Scanner> {
                    scalar_plan::<Self>(columns)
                }

                fn scan_row(&mut self, plan: &Scanner, values: Vec<Datum>) -> Result<()> {
                    scalar_row(self, *plan, values)
                }
            }

            impl<$param: $($bound +)+> Destination for $ty<$param> {
                fn decode_rows<C: Cursor + ?Sized>(
                    &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
                ) -> Result<usize> {
                    single_row(self, columns, cursor)
                }
            }
        )*
    };
}

generic_scalar_destination! {
    Option<T: Scan | Default>,
    Json<T: DeserializeOwned | Default>,
    Array<T: Element>,
}

// A vector of elements decodes one column of one row, for example a whole
// array column or a blob.
impl<T: Element> FromRow for Vec<T> {
    type Plan = Scanner;

    fn plan(columns: &[ColumnDescriptor]) -> Result<Scanner> {
        scalar_plan::<Self>(columns)
    }

    fn scan_row(&mut self, plan: &Scanner, values: Vec<Datum>) -> Result<()> {
        scalar_row(self, *plan, values)
    }
}

impl<T: FromRow> FromRow for Box<T> {
    type Plan = T::Plan;

    fn plan(columns: &[ColumnDescriptor]) -> Result<Self::Plan> {
        T::plan(columns)
    }

    fn scan_row(&mut self, plan: &Self::Plan, values: Vec<Datum>) -> Result<()> {
        (**self).scan_row(plan, values)
    }
}

impl<T: Destination + ?Sized> Destination for Box<T> {
    fn decode_rows<C: Cursor + ?Sized>(
        &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
    ) -> Result<usize> {
        (**self).decode_rows(columns, cursor)
    }
}

/// Collection root: one new element per row, appended in row order.
impl<T: FromRow> Destination for Vec<T> {
    fn decode_rows<C: Cursor + ?Sized>(
        &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
    ) -> Result<usize> {
        let plan = T::plan(columns)?;
        let mut count = 0;
        while let Some(values) = next_row(cursor)? {
            let mut element = T::default();
            element.scan_row(&plan, values)?;
            self.push(element);
            count += 1;
        }
        Ok(count)
    }
}

/// Plan for record destinations: one resolved field and scanner per column.
#[derive(Debug, Clone)]
pub struct RecordPlan {
    bindings: Vec<(Accessor, Scanner)>,
}

impl RecordPlan {
    /// Resolves every column against the fields of `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchField`] naming the field path of the first
    /// column that matches no field, or [`Error::AmbiguousField`].
    pub fn new<R: Record>(columns: &[ColumnDescriptor]) -> Result<Self> {
        let mut probe = R::default();
        let bindings = columns
            .iter()
            .map(|column| {
                let accessor = Accessor::resolve::<R>(&column.field_path())?;
                let scanner = Scanner::select(accessor.write(&mut probe)?, column);
                Ok((accessor, scanner))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bindings })
    }

    /// Decodes one row into `record`.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn scan<R: Record>(&self, record: &mut R, values: Vec<Datum>) -> Result<()> {
        check_width(&values, self.bindings.len())?;
        for ((accessor, scanner), value) in self.bindings.iter().zip(values) {
            scanner.scan(accessor.write(record)?, value)?;
        }
        Ok(())
    }
}

macro_rules! map_destination {
    ($($map:ident),*) => {
        $(
            impl<V: Scan + Default> FromRow for $map<String, V> {
                type Plan = Vec<(String, Scanner)>;

                fn plan(columns: &[ColumnDescriptor]) -> Result<Self::Plan> {
                    let probe = V::default();
                    Ok(columns
                        .iter()
                        .map(|column| {
                            (column.field_path().join("."), Scanner::select(&probe, column))
                        })
                        .collect())
                }

                fn scan_row(&mut self, plan: &Self::Plan, values: Vec<Datum>) -> Result<()> {
                    check_width(&values, plan.len())?;
                    for ((key, scanner), value) in plan.iter().zip(values) {
                        let mut slot = V::default();
                        scanner.scan(&mut slot, value)?;
                        self.insert(key.clone(), slot);
                    }
                    Ok(())
                }
            }

            /// Map root: every column of every row, keyed by field name.
            impl<V: Scan + Default> Destination for $map<String, V> {
                fn decode_rows<C: Cursor + ?Sized>(
                    &mut self, columns: &[ColumnDescriptor], cursor: &mut C,
                ) -> Result<usize> {
                    let plan = Self::plan(columns)?;
                    let mut count = 0;
                    while let Some(values) = next_row(cursor)? {
                        self.scan_row(&plan, values)?;
                        count += 1;
                    }
                    Ok(count)
                }
            }
        )*
    };
}

map_destination!(HashMap, BTreeMap);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::MemoryCursor;

    #[test]
    fn no_columns() {
        let mut cursor = MemoryCursor::default();
        let mut n = 0_i32;
        assert!(matches!(decode(&mut cursor, &mut n), Err(Error::NoColumns)));
    }

    #[test]
    fn scalar_reads_one_row() {
        let mut cursor =
            MemoryCursor::with_names(&["n"]).row(vec![Datum::Int(1)]).row(vec![Datum::Int(2)]);
        let mut n = 0_i64;
        decode(&mut cursor, &mut n).unwrap();
        assert_eq!(n, 1);
        assert_eq!(cursor.next_row().unwrap(), Some(vec![Datum::Int(2)]));
    }

    #[test]
    fn scalar_without_rows_is_untouched() {
        let mut cursor = MemoryCursor::with_names(&["n"]);
        let mut n = 42_i64;
        decode(&mut cursor, &mut n).unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn scalar_needs_one_column() {
        let mut cursor = MemoryCursor::with_names(&["a", "b"]).row(vec![Datum::Int(1), Datum::Int(2)]);
        let mut n = 0_i64;
        assert!(matches!(decode(&mut cursor, &mut n), Err(Error::Shape(_))));
    }

    #[test]
    fn short_row_is_a_cursor_error() {
        let mut cursor = MemoryCursor::with_names(&["a", "b"]).row(vec![Datum::Int(1)]);
        let mut rows: Vec<HashMap<String, i64>> = Vec::new();
        assert!(matches!(decode(&mut cursor, &mut rows), Err(Error::Cursor(_))));
    }

    #[test]
    fn map_keys_are_field_names() {
        let mut cursor = MemoryCursor::with_names(&["user_id", "profile.nick_name"])
            .row(vec![Datum::Int(1), Datum::Text("a".to_string())])
            .row(vec![Datum::Int(2), Datum::Null]);
        let mut map: BTreeMap<String, Datum> = BTreeMap::new();
        decode(&mut cursor, &mut map).unwrap();
        assert_eq!(map.get("UserId"), Some(&Datum::Int(2)));
        assert_eq!(map.get("Profile.NickName"), Some(&Datum::Null));
    }

    #[test]
    fn blob_column() {
        let mut cursor = MemoryCursor::with_names(&["data"]).row(vec![Datum::Bytes(vec![1, 2, 3])]);
        let mut blob: Vec<Vec<u8>> = Vec::new();
        decode(&mut cursor, &mut blob).unwrap();
        assert_eq!(blob, [vec![1, 2, 3]]);
    }
}
