//! Record metadata and field slots.
//!
//! The [`record!`](crate::record!) macro declares a struct together with an
//! ordered table of its fields. Columns and field paths resolve against that
//! table once per result set; rows then reach each field through its index
//! path without any lookup by name.

use crate::naming::column_to_field;
use crate::scan::Scan;
use crate::value::ToSql;

/// One field of a record.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Rust identifier of the field (`user_name`).
    pub ident: &'static str,
    /// How the field takes part in path resolution.
    pub kind: FieldKind,
}

impl FieldDef {
    /// Field identifier used in field paths (`UserName`).
    #[must_use]
    pub fn name(&self) -> String {
        column_to_field(self.ident)
    }

    /// Whether `segment` addresses this field, by field identifier or by
    /// Rust identifier.
    #[must_use]
    pub fn matches(&self, segment: &str) -> bool {
        self.ident == segment || self.name() == segment
    }
}

/// Role of a field in path resolution.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A column value.
    Leaf,
    /// A sub-record addressed by a dotted path (`profile.name`).
    Nested(fn() -> &'static [FieldDef]),
    /// A sub-record whose fields are searched as if declared on the parent.
    Embedded(fn() -> &'static [FieldDef]),
    /// Never matched by any column or path.
    Skip,
}

/// A struct whose fields can be addressed by field path.
///
/// Implemented by [`record!`](crate::record!); index paths come from
/// [`crate::Accessor`].
pub trait Record: Default {
    /// Fields in declaration order.
    fn fields() -> &'static [FieldDef];

    /// Leaf slot at `index`, allocating absent optional links on the way.
    fn slot_mut(&mut self, index: &[usize]) -> Option<&mut dyn Scan>;

    /// Leaf value at `index`, or `None` if a link on the way is absent.
    fn slot(&self, index: &[usize]) -> Option<&dyn ToSql>;
}

/// Indirection from a field to the record it holds: the record itself, a
/// `Box` or an `Option`.
pub trait Link {
    /// The record behind the indirection.
    type Target: Record;

    /// The target, allocated if absent.
    fn link_mut(&mut self) -> &mut Self::Target;

    /// The target, if present.
    fn link(&self) -> Option<&Self::Target>;
}

impl<L: Link + Default> Link for Option<L> {
    type Target = L::Target;

    fn link_mut(&mut self) -> &mut Self::Target {
        self.get_or_insert_with(L::default).link_mut()
    }

    fn link(&self) -> Option<&Self::Target> {
        self.as_ref()?.link()
    }
}

impl<L: Link> Link for Box<L> {
    type Target = L::Target;

    fn link_mut(&mut self) -> &mut Self::Target {
        (**self).link_mut()
    }

    fn link(&self) -> Option<&Self::Target> {
        (**self).link()
    }
}

/// Field roles selected by `#[sql(..)]` annotations in [`record!`](crate::record!).
#[doc(hidden)]
pub mod kind {
    pub struct Leaf;
    pub struct Nested;
    pub struct Embedded;
    pub struct Skip;
}

/// Per-role access to a single field, used by code generated by
/// [`record!`](crate::record!).
#[doc(hidden)]
pub trait FieldAccess<K> {
    const KIND: FieldKind;

    fn slot_mut(&mut self, rest: &[usize]) -> Option<&mut dyn Scan>;

    fn slot(&self, rest: &[usize]) -> Option<&dyn ToSql>;
}

impl<T: Scan + ToSql> FieldAccess<kind::Leaf> for T {
    const KIND: FieldKind = FieldKind::Leaf;

    fn slot_mut(&mut self, rest: &[usize]) -> Option<&mut dyn Scan> {
        rest.is_empty().then_some(self as &mut dyn Scan)
    }

    fn slot(&self, rest: &[usize]) -> Option<&dyn ToSql> {
        rest.is_empty().then_some(self as &dyn ToSql)
    }
}

impl<L: Link> FieldAccess<kind::Nested> for L {
    const KIND: FieldKind = FieldKind::Nested(<L::Target as Record>::fields);

    fn slot_mut(&mut self, rest: &[usize]) -> Option<&mut dyn Scan> {
        Record::slot_mut(self.link_mut(), rest)
    }

    fn slot(&self, rest: &[usize]) -> Option<&dyn ToSql> {
        Record::slot(self.link()?, rest)
    }
}

impl<L: Link> FieldAccess<kind::Embedded> for L {
    const KIND: FieldKind = FieldKind::Embedded(<L::Target as Record>::fields);

    fn slot_mut(&mut self, rest: &[usize]) -> Option<&mut dyn Scan> {
        Record::slot_mut(self.link_mut(), rest)
    }

    fn slot(&self, rest: &[usize]) -> Option<&dyn ToSql> {
        Record::slot(self.link()?, rest)
    }
}

impl<T> FieldAccess<kind::Skip> for T {
    const KIND: FieldKind = FieldKind::Skip;

    fn slot_mut(&mut self, _: &[usize]) -> Option<&mut dyn Scan> {
        None
    }

    fn slot(&self, _: &[usize]) -> Option<&dyn ToSql> {
        None
    }
}

/// Declares a record: a struct that rows decode into and whose fields can be
/// encoded by field path.
///
/// The struct must implement `Default`. Fields are column values unless the
/// first attribute on the field says otherwise:
///
/// - `#[sql(nested)]`: a sub-record (plain, boxed or optional) addressed
///   with dotted columns such as `profile.user_name`.
/// - `#[sql(embed)]`: a sub-record whose fields resolve as if declared
///   on the parent.
/// - `#[sql(skip)]`: never bound to a column.
///
/// # Examples
///
/// ```rust
/// sqlbind::record! {
///     #[derive(Debug, Default)]
///     pub struct Profile {
///         pub bio: String,
///     }
/// }
///
/// sqlbind::record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64,
///         pub user_name: String,
///         #[sql(nested)]
///         pub profile: Option<Profile>,
///         #[sql(skip)]
///         pub cached: bool,
///     }
/// }
///
/// use sqlbind::{Datum, MemoryCursor};
///
/// let mut cursor = MemoryCursor::with_names(&["id", "user_name", "profile.bio"])
///     .row(vec![Datum::Int(7), Datum::Text("li".into()), Datum::Text("hi".into())]);
///
/// let mut user = User::default();
/// sqlbind::decode(&mut cursor, &mut user).unwrap();
/// assert_eq!(user.user_name, "li");
/// assert_eq!(user.profile.unwrap().bio, "hi");
/// ```
#[macro_export]
macro_rules! record {
    // Field annotated `#[sql(nested)]`
    (
        @munch $head:tt [$($done:tt)*]
        #[sql(nested)]
        $(#[$field_meta:meta])*
        $field_vis:vis $field_name:ident : $field_type:ty
        $(, $($rest:tt)*)?
    ) => {
        $crate::record! {
            @munch $head
            [$($done)* (Nested [$(#[$field_meta])*] $field_vis $field_name : $field_type)]
            $($($rest)*)?
        }
    };

    // Field annotated `#[sql(embed)]`
    (
        @munch $head:tt [$($done:tt)*]
        #[sql(embed)]
        $(#[$field_meta:meta])*
        $field_vis:vis $field_name:ident : $field_type:ty
        $(, $($rest:tt)*)?
    ) => {
        $crate::record! {
            @munch $head
            [$($done)* (Embedded [$(#[$field_meta])*] $field_vis $field_name : $field_type)]
            $($($rest)*)?
        }
    };

    // Field annotated `#[sql(skip)]`
    (
        @munch $head:tt [$($done:tt)*]
        #[sql(skip)]
        $(#[$field_meta:meta])*
        $field_vis:vis $field_name:ident : $field_type:ty
        $(, $($rest:tt)*)?
    ) => {
        $crate::record! {
            @munch $head
            [$($done)* (Skip [$(#[$field_meta])*] $field_vis $field_name : $field_type)]
            $($($rest)*)?
        }
    };

    // Plain column field
    (
        @munch $head:tt [$($done:tt)*]
        $(#[$field_meta:meta])*
        $field_vis:vis $field_name:ident : $field_type:ty
        $(, $($rest:tt)*)?
    ) => {
        $crate::record! {
            @munch $head
            [$($done)* (Leaf [$(#[$field_meta])*] $field_vis $field_name : $field_type)]
            $($($rest)*)?
        }
    };

    // All fields classified (single code-generation arm)
    (
        @munch [$(#[$meta:meta])* $vis:vis struct $struct_name:ident]
        [$( ($kind:ident [$($attr:tt)*] $field_vis:vis $field_name:ident : $field_type:ty) )*]
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        $vis struct $struct_name {
            $(
                $($attr)*
                $field_vis $field_name : $field_type,
            )*
        }

        impl $crate::Record for $struct_name {
            fn fields() -> &'static [$crate::FieldDef] {
                const FIELDS: &[$crate::FieldDef] = &[
                    $(
                        $crate::FieldDef {
                            ident: stringify!($field_name),
                            kind: <$field_type as $crate::__private::FieldAccess<
                                $crate::__private::kind::$kind,
                            >>::KIND,
                        },
                    )*
                ];
                FIELDS
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn slot_mut(&mut self, index: &[usize]) -> Option<&mut dyn $crate::Scan> {
                let (&first, rest) = index.split_first()?;
                let mut position = 0_usize;
                $(
                    if first == position {
                        return <$field_type as $crate::__private::FieldAccess<
                            $crate::__private::kind::$kind,
                        >>::slot_mut(&mut self.$field_name, rest);
                    }
                    position += 1;
                )*
                None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn slot(&self, index: &[usize]) -> Option<&dyn $crate::ToSql> {
                let (&first, rest) = index.split_first()?;
                let mut position = 0_usize;
                $(
                    if first == position {
                        return <$field_type as $crate::__private::FieldAccess<
                            $crate::__private::kind::$kind,
                        >>::slot(&self.$field_name, rest);
                    }
                    position += 1;
                )*
                None
            }
        }

        impl $crate::Link for $struct_name {
            type Target = Self;

            fn link_mut(&mut self) -> &mut Self {
                self
            }

            fn link(&self) -> Option<&Self> {
                Some(self)
            }
        }

        impl $crate::FromRow for $struct_name {
            type Plan = $crate::RecordPlan;

            fn plan(columns: &[$crate::ColumnDescriptor]) -> $crate::Result<Self::Plan> {
                $crate::RecordPlan::new::<Self>(columns)
            }

            fn scan_row(
                &mut self, plan: &Self::Plan, values: Vec<$crate::Datum>,
            ) -> $crate::Result<()> {
                plan.scan(self, values)
            }
        }

        impl $crate::Destination for $struct_name {
            fn decode_rows<C: $crate::Cursor + ?Sized>(
                &mut self, columns: &[$crate::ColumnDescriptor], cursor: &mut C,
            ) -> $crate::Result<usize> {
                $crate::__private::single_row(self, columns, cursor)
            }
        }
    };

    // Entry point
    (
        $(#[$meta:meta])*
        $vis:vis struct $struct_name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::record! {
            @munch [$(#[$meta])* $vis struct $struct_name] []
            $($body)*
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Record;
    use crate::record::FieldKind;

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Inner {
            pub code: i32,
        }
    }

    crate::record! {
        #[derive(Debug, Default)]
        struct Outer {
            id: u64,
            #[sql(nested)]
            inner: Option<Box<Inner>>,
            #[sql(embed)]
            base: Inner,
            #[sql(skip)]
            /// Not a column.
            scratch: Vec<String>,
        }
    }

    #[test]
    fn field_table() {
        let fields = Outer::fields();
        let idents: Vec<&str> = fields.iter().map(|f| f.ident).collect();
        assert_eq!(idents, ["id", "inner", "base", "scratch"]);
        assert!(matches!(fields[0].kind, FieldKind::Leaf));
        assert!(matches!(fields[1].kind, FieldKind::Nested(f) if f()[0].ident == "code"));
        assert!(matches!(fields[2].kind, FieldKind::Embedded(_)));
        assert!(matches!(fields[3].kind, FieldKind::Skip));
        assert_eq!(fields[1].name(), "Inner");
        assert!(fields[0].matches("Id") && fields[0].matches("id"));
    }

    #[test]
    fn slots_allocate_for_write_only() {
        let mut outer = Outer::default();
        assert!(outer.slot(&[1, 0]).is_none());
        assert!(outer.slot_mut(&[1, 0]).is_some());
        assert_eq!(outer.inner.as_deref(), Some(&Inner::default()));
        assert!(outer.slot(&[1, 0]).is_some());

        assert!(outer.slot_mut(&[3]).is_none());
        assert!(outer.slot_mut(&[1]).is_none());
        assert!(outer.slot_mut(&[9]).is_none());
        assert!(outer.slot_mut(&[]).is_none());
    }
}
