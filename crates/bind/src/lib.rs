//! Bidirectional codec between SQL result rows and typed Rust values.
//!
//! Decoding binds a result set (column descriptors plus positional row
//! values) onto a destination: a scalar, a record, a `Vec` of either, or a
//! map keyed by field name. Encoding renders a value as SQL literal text with
//! quoting, `NULL` handling, timestamp formatting and array syntax.
//!
//! # Quick Start
//!
//! ## Declare a Record
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//!
//! sqlbind::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Post {
//!         pub id: i64,
//!         pub title: String,
//!         pub published: bool,
//!         pub created_at: DateTime<Utc>,
//!     }
//! }
//! ```
//!
//! Column `created_at` binds to field `created_at` (field identifier
//! `CreatedAt`); dotted columns such as `author.user_name` bind into
//! `#[sql(nested)]` sub-records.
//!
//! ## Decode Rows
//!
//! ```rust
//! # sqlbind::record! {
//! #     #[derive(Debug, Default)]
//! #     pub struct Post {
//! #         pub id: i64,
//! #         pub title: String,
//! #     }
//! # }
//! use sqlbind::{Datum, MemoryCursor};
//!
//! let mut cursor = MemoryCursor::with_names(&["id", "title"])
//!     .row(vec![Datum::Int(1), Datum::Text("first".into())])
//!     .row(vec![Datum::Int(2), Datum::Null]);
//!
//! let mut posts: Vec<Post> = Vec::new();
//! sqlbind::decode(&mut cursor, &mut posts)?;
//! assert_eq!(posts[1].title, "");
//! # Ok::<(), sqlbind::Error>(())
//! ```
//!
//! ## Encode Values
//!
//! ```rust
//! # sqlbind::record! {
//! #     #[derive(Debug, Default)]
//! #     pub struct Post {
//! #         pub id: i64,
//! #         pub title: String,
//! #     }
//! # }
//! let posts = [
//!     Post { id: 1, title: "it's".into() },
//!     Post { id: 2, title: "done".into() },
//! ];
//!
//! let values = sqlbind::encode_bulk_rows(&posts, &["Id", "Title"])?;
//! assert_eq!(values, "(1,'it''s'),(2,'done')");
//!
//! assert_eq!(sqlbind::encode(&Some(3.5))?, "3.5");
//! assert_eq!(sqlbind::encode_array(&["a", "b"])?, r#"'{"a","b"}'"#);
//! # Ok::<(), sqlbind::Error>(())
//! ```
//!
//! ## Custom Types
//!
//! Implement [`ToSql`] to reduce a type to a driver primitive, and [`Scan`]
//! (returning `true` from [`Scan::custom`]) to decode it whatever the
//! column's declared type.

#![forbid(unsafe_code)]

mod array;
mod column;
mod decode;
mod encode;
mod error;
mod naming;
mod path;
mod record;
mod scan;
mod value;

pub use column::{ColumnDescriptor, Cursor, Datum, MemoryCursor};
pub use decode::{Destination, FromRow, RecordPlan, decode};
pub use encode::{
    encode, encode_array, encode_bulk_rows, encode_field_values, encode_json, encode_row_values,
    encode_tuple, encode_tuples, encode_value, pattern_escape, quote,
};
pub use error::{Error, Result};
pub use naming::{
    column_to_field, column_to_field_path, columns_to_fields, field_to_column, fields_to_columns,
    fields_to_columns_str,
};
pub use path::{Accessor, field_names, resolve_for_read, resolve_for_write};
pub use record::{FieldDef, FieldKind, Link, Record};
pub use scan::{Element, Scan, Scanner};
pub use value::{Array, Json, Raw, SqlElement, ToSql, Value};

// Re-exports for `record!` macro use only.
#[doc(hidden)]
pub mod __private {
    pub use crate::decode::single_row;
    pub use crate::record::{FieldAccess, kind};
}
