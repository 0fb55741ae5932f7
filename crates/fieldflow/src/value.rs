//! Value kinds and the traits field values implement.
//!
//! A [`Field`](crate::Field) is generic over its value type. The traits here
//! decide which operators that field exposes:
//!
//! - [`FieldValue`] - every value type: equality, null checks, comparators
//! - [`OrderedValue`] - ordering, range and set-membership operators
//!
//! `bool` is a [`FieldValue`] but not an [`OrderedValue`]: boolean fields only
//! offer `equal`/`not_equal`, yet still sort consistently (`false < true`).

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime};

/// The primitive or reference kind of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
    /// Any other comparable type, opted in with [`comparable_value!`](crate::comparable_value).
    Reference,
}

impl ValueKind {
    /// Returns `true` for the integer widths.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ValueKind::I8
                | ValueKind::I16
                | ValueKind::I32
                | ValueKind::I64
                | ValueKind::I128
                | ValueKind::Isize
                | ValueKind::U8
                | ValueKind::U16
                | ValueKind::U32
                | ValueKind::U64
                | ValueKind::U128
                | ValueKind::Usize
        )
    }

    /// Returns `true` for `f32` and `f64`.
    pub fn is_floating(self) -> bool {
        matches!(self, ValueKind::F32 | ValueKind::F64)
    }

    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::I128 => "i128",
            ValueKind::Isize => "isize",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::U128 => "u128",
            ValueKind::Usize => "usize",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Char => "char",
            ValueKind::String => "string",
            ValueKind::Reference => "reference",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A type that can be held by a [`Field`](crate::Field).
///
/// `compare` must be a total order. It backs comparators, set membership and
/// (for [`OrderedValue`] types) the ordering predicates. Floating point types
/// use IEEE total ordering, so `NaN` equals itself and sorts above infinity.
/// Signed zeros are distinct under that order: `-0.0` sorts below `0.0`, so
/// `equal(0.0)` does not match `-0.0` and `greater_than(-0.0)` holds for `0.0`.
/// That keeps every predicate and its negation exact complements.
pub trait FieldValue: fmt::Debug + Clone + Send + Sync + 'static {
    /// The kind tag reported by fields of this type.
    const KIND: ValueKind;

    /// Total comparison of two values.
    fn compare(&self, other: &Self) -> Ordering;

    /// Equality consistent with [`compare`](FieldValue::compare).
    fn value_eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Textual view used by the string predicates. Only `String` returns `Some`.
    fn as_text(&self) -> Option<&str> {
        None
    }
}

/// Marker for value types that support ordering, range and set predicates.
pub trait OrderedValue: FieldValue {}

/// Implements [`FieldValue`] and [`OrderedValue`] for types with a total `Ord`.
///
/// Such types report [`ValueKind::Reference`].
///
/// ```
/// use fieldflow::{comparable_value, FieldValue, ValueKind};
///
/// #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// struct Version(u32, u32);
///
/// comparable_value!(Version);
///
/// assert_eq!(<Version as FieldValue>::KIND, ValueKind::Reference);
/// assert!(Version(1, 2).compare(&Version(1, 10)).is_lt());
/// ```
#[macro_export]
macro_rules! comparable_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FieldValue for $ty {
                const KIND: $crate::ValueKind = $crate::ValueKind::Reference;

                fn compare(&self, other: &Self) -> ::std::cmp::Ordering {
                    ::std::cmp::Ord::cmp(self, other)
                }
            }

            impl $crate::OrderedValue for $ty {}
        )+
    };
}

macro_rules! ordered_primitive {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn compare(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }
            }

            impl OrderedValue for $ty {}
        )+
    };
}

ordered_primitive! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    char => Char,
}

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::F32;

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl OrderedValue for f32 {}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::F64;

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl OrderedValue for f64 {}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl OrderedValue for String {}

crate::comparable_value!(Duration, SystemTime);

/// Runtime identity of a Rust type, used as a record type or stream shape tag.
///
/// Equality and hashing use the [`TypeId`] only. The name is for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Returns `true` if this tag identifies `T`.
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
