//! Field path resolution.
//!
//! A field path (`["Profile", "UserName"]`) resolves against a record's
//! field table into an index path. Fields of embedded records are found as
//! if declared on their parent: each segment is searched level by level,
//! nearest embedding depth first, and two matches at the same depth are an
//! error.

use crate::error::{Error, Result};
use crate::naming::column_to_field;
use crate::record::{FieldDef, FieldKind, Record};
use crate::scan::Scan;
use crate::value::ToSql;

// Bounds the search through embedded records.
const MAX_EMBED_DEPTH: usize = 32;

/// A resolved field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    path: String,
    index: Vec<usize>,
}

impl Accessor {
    /// Resolves `path` against the fields of `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchField`] if a segment matches no field,
    /// [`Error::AmbiguousField`] if a segment matches more than one field at
    /// the same embedding depth, and [`Error::Shape`] if the path ends on a
    /// sub-record rather than a column value.
    pub fn resolve<R: Record>(path: &[String]) -> Result<Self> {
        Ok(Self {
            path: path.join("."),
            index: resolve(R::fields(), path)?,
        })
    }

    /// Resolves a dotted field path such as `Profile.UserName`.
    ///
    /// # Errors
    ///
    /// See [`Accessor::resolve`].
    pub fn parse<R: Record>(field: &str) -> Result<Self> {
        let path: Vec<String> = field.split('.').map(str::to_string).collect();
        Self::resolve::<R>(&path)
    }

    /// Resolves each of `fields`, in order.
    ///
    /// # Errors
    ///
    /// See [`Accessor::resolve`].
    pub fn resolve_all<R: Record>(fields: &[&str]) -> Result<Vec<Self>> {
        fields.iter().map(|field| Self::parse::<R>(field)).collect()
    }

    /// The dotted field path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Field positions, one per record level.
    #[must_use]
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// The leaf value in `record`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchField`] if an optional link on the path is
    /// absent. Nothing is allocated.
    pub fn read<'r, R: Record>(&self, record: &'r R) -> Result<&'r dyn ToSql> {
        record.slot(&self.index).ok_or_else(|| Error::NoSuchField(self.path.clone()))
    }

    /// The leaf slot in `record`, allocating absent optional links.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchField`] if the index does not address a leaf
    /// of `R`.
    pub fn write<'r, R: Record>(&self, record: &'r mut R) -> Result<&'r mut dyn Scan> {
        record.slot_mut(&self.index).ok_or_else(|| Error::NoSuchField(self.path.clone()))
    }
}

/// Locates the writable leaf addressed by `path`, allocating absent optional
/// links on the way.
///
/// # Errors
///
/// See [`Accessor::resolve`].
pub fn resolve_for_write<'r, R: Record>(
    record: &'r mut R, path: &[String],
) -> Result<&'r mut dyn Scan> {
    Accessor::resolve::<R>(path)?.write(record)
}

/// Reads the leaf addressed by `path`.
///
/// # Errors
///
/// See [`Accessor::resolve`]. An absent optional link yields
/// [`Error::NoSuchField`].
pub fn resolve_for_read<'r, R: Record>(record: &'r R, path: &[String]) -> Result<&'r dyn ToSql> {
    Accessor::resolve::<R>(path)?.read(record)
}

/// Field identifiers of `R` in declaration order, with embedded records
/// flattened and skipped fields left out. Fields named in `exclude` are
/// dropped too.
///
/// Together with [`crate::fields_to_columns_str`] this yields the column
/// list for a record:
///
/// ```rust
/// sqlbind::record! {
///     #[derive(Default)]
///     pub struct Post {
///         pub id: i64,
///         pub title: String,
///         pub created_at: String,
///     }
/// }
///
/// let names = sqlbind::field_names::<Post>(&["CreatedAt"]);
/// assert_eq!(names, ["Id", "Title"]);
/// ```
#[must_use]
pub fn field_names<R: Record>(exclude: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(R::fields(), 0, &mut names);
    names.retain(|name| !exclude.contains(&name.as_str()));
    names
}

fn collect_names(fields: &[FieldDef], depth: usize, names: &mut Vec<String>) {
    for field in fields {
        match field.kind {
            FieldKind::Skip => {}
            FieldKind::Embedded(children) if depth < MAX_EMBED_DEPTH => {
                collect_names(children(), depth + 1, names);
            }
            _ => names.push(column_to_field(field.ident)),
        }
    }
}

/// Resolves `path` into field positions.
pub(crate) fn resolve(fields: &'static [FieldDef], path: &[String]) -> Result<Vec<usize>> {
    let joined = || path.join(".");
    if path.is_empty() {
        return Err(Error::NoSuchField(String::new()));
    }

    let mut index = Vec::with_capacity(path.len());
    let mut level = fields;
    for (i, segment) in path.iter().enumerate() {
        let found = find(level, segment).map_err(|()| Error::AmbiguousField(joined()))?;
        let (found, kind) = found.ok_or_else(|| Error::NoSuchField(joined()))?;
        index.extend(found);

        let last = i + 1 == path.len();
        match kind {
            FieldKind::Leaf if last => return Ok(index),
            FieldKind::Nested(children) | FieldKind::Embedded(children) if !last => {
                level = children();
            }
            FieldKind::Nested(_) | FieldKind::Embedded(_) => {
                return Err(Error::Shape(format!("field '{}' is a record, not a column", joined())));
            }
            FieldKind::Leaf | FieldKind::Skip => return Err(Error::NoSuchField(joined())),
        }
    }
    Ok(index)
}

type Frontier = Vec<(Vec<usize>, &'static [FieldDef])>;

/// Searches `fields` and their embedded records for `segment`, one embedding
/// depth at a time. `Err(())` signals more than one match at the nearest
/// depth that has any.
fn find(fields: &'static [FieldDef], segment: &str) -> Result<Option<(Vec<usize>, FieldKind)>, ()> {
    let mut frontier: Frontier = vec![(Vec::new(), fields)];

    for _ in 0..MAX_EMBED_DEPTH {
        let mut matches = Vec::new();
        let mut next: Frontier = Vec::new();

        for (prefix, defs) in &frontier {
            for (position, def) in defs.iter().enumerate() {
                if matches!(def.kind, FieldKind::Skip) {
                    continue;
                }
                let mut index = prefix.clone();
                index.push(position);
                if def.matches(segment) {
                    matches.push((index.clone(), def.kind));
                }
                if let FieldKind::Embedded(children) = def.kind {
                    next.push((index, children()));
                }
            }
        }

        match matches.len() {
            0 if next.is_empty() => return Ok(None),
            0 => frontier = next,
            1 => return Ok(matches.pop()),
            _ => return Err(()),
        }
    }
    Ok(None)
}
