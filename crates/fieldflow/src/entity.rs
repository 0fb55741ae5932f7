//! Record-type metadata.
//!
//! This module provides the [`Entity`] trait, implemented by
//! `#[derive(Entity)]` to describe the queryable columns of a record type.

use crate::value::{TypeTag, ValueKind};

/// Static description of one column of an [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    /// Column name, unique within the record type.
    pub name: &'static str,
    /// Kind of the column's value.
    pub kind: ValueKind,
    /// `true` if the column's getter may yield null.
    pub nullable: bool,
    /// `true` if the column is a candidate key.
    pub unique: bool,
}

/// A record type with declared columns.
///
/// Usually derived; the derive also generates one associated
/// [`Field`](crate::Field) constant per column.
///
/// # Derive Usage
///
/// ```
/// use fieldflow::{Entity, ValueKind};
///
/// #[derive(Entity)]
/// struct Person {
///     #[field(unique)]
///     id: u64,
///     #[field]
///     name: Option<String>,
///     #[field(rename = "years")]
///     age: i32,
///     scratch: Vec<u8>,
/// }
///
/// assert_eq!(Person::COLUMNS.len(), 3);
/// assert!(Person::ID.is_unique());
/// assert!(Person::NAME.is_nullable());
/// assert_eq!(Person::AGE.column_name(), "years");
/// assert_eq!(Person::column("years").map(|c| c.kind), Some(ValueKind::I32));
/// ```
///
/// # Manual Implementation
///
/// ```
/// use fieldflow::{Column, Entity, ValueKind};
///
/// struct Tag {
///     label: String,
/// }
///
/// impl Entity for Tag {
///     const COLUMNS: &'static [Column] = &[Column {
///         name: "label",
///         kind: ValueKind::String,
///         nullable: false,
///         unique: true,
///     }];
/// }
///
/// assert!(Tag::column("label").is_some_and(|c| c.unique));
/// ```
pub trait Entity: Sized + 'static {
    /// Every declared column, in declaration order.
    const COLUMNS: &'static [Column];

    /// Looks up a column by name.
    fn column(name: &str) -> Option<&'static Column> {
        Self::COLUMNS.iter().find(|c| c.name == name)
    }

    /// The record type's tag.
    fn table() -> TypeTag {
        TypeTag::of::<Self>()
    }

    /// Columns that are candidate keys.
    fn unique_columns() -> Vec<&'static Column> {
        Self::COLUMNS.iter().filter(|c| c.unique).collect()
    }
}
