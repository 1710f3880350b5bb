//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while decoding rows or encoding values.
///
/// Every variant is terminal for the decode or encode call that produced it.
/// Partially populated destinations are left as they are and should be
/// discarded by the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The destination cannot receive the result set.
    #[error("destination cannot receive rows: {0}")]
    Shape(String),

    /// The result set reports no columns.
    #[error("result set has no columns")]
    NoColumns,

    /// A column or field path resolves to no field in the record.
    #[error("no field '{0}' in record")]
    NoSuchField(String),

    /// A column or field path resolves to more than one field at the same
    /// embedding depth.
    #[error("multiple fields '{0}' in record")]
    AmbiguousField(String),

    /// The source value cannot be assigned to the destination type.
    #[error("cannot assign {src} to {dest}")]
    TypeMismatch {
        /// Source type and value, e.g. `text("abc")`.
        src: String,
        /// Destination type name.
        dest: &'static str,
    },

    /// The source value does not fit the destination's width or signedness.
    #[error("cannot assign {src} to {dest}: value out of range")]
    OutOfRange {
        /// Source type and value, e.g. `int64(128)`.
        src: String,
        /// Destination type name.
        dest: &'static str,
    },

    /// A value could not be reduced to SQL literal text.
    #[error("cannot encode value: {0}")]
    Encode(String),

    /// A JSON column payload could not be decoded into the destination.
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The cursor provider failed.
    #[error(transparent)]
    Cursor(anyhow::Error),
}

impl Error {
    pub(crate) fn mismatch<T: ?Sized>(src: impl Into<String>) -> Self {
        Self::TypeMismatch {
            src: src.into(),
            dest: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn out_of_range<T: ?Sized>(src: impl Into<String>) -> Self {
        Self::OutOfRange {
            src: src.into(),
            dest: std::any::type_name::<T>(),
        }
    }
}
