//! Typed handles to record attributes.
//!
//! A [`Field<E, V>`] names one attribute of record type `E` holding values of
//! type `V`, and carries the getter that reads it. Every predicate and
//! comparator is built from a field:
//!
//! ```
//! use fieldflow::{Field, Inclusion};
//!
//! struct Person {
//!     age: i32,
//!     name: Option<String>,
//! }
//!
//! fn age(p: &Person) -> &i32 {
//!     &p.age
//! }
//!
//! fn name(p: &Person) -> Option<&String> {
//!     p.name.as_ref()
//! }
//!
//! let age = Field::new("age", age, false)?;
//! let name = Field::nullable("name", name, false)?;
//!
//! let ann = Person { age: 30, name: Some("Ann".into()) };
//! assert!(age.between(18, 65, Inclusion::StartInclusiveEndInclusive).test(&ann));
//! assert!(name.starts_with_ignore_case("an").test(&ann));
//! assert!(!name.is_null().test(&ann));
//! # Ok::<(), fieldflow::FieldflowError>(())
//! ```
//!
//! Which operators exist depends on `V`: every [`FieldValue`] gets equality and
//! null checks, [`OrderedValue`] types add ordering, range and set operators,
//! and `String` fields add the text operators.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;
use tracing::warn;

use crate::comparator::{FieldComparator, NullOrder};
use crate::error::{FieldflowError, Result};
use crate::predicate::{fold_case, FieldPredicate, Inclusion, Operand, PredicateType, ValueSet};
use crate::value::{FieldValue, OrderedValue, TypeTag, ValueKind};

/// Reads a value that is always present.
pub type ValueGetter<E, V> = for<'a> fn(&'a E) -> &'a V;

/// Reads a value that may be null.
pub type NullableGetter<E, V> = for<'a> fn(&'a E) -> Option<&'a V>;

/// The getter of a [`Field`].
pub enum Getter<E, V> {
    Value(ValueGetter<E, V>),
    Nullable(NullableGetter<E, V>),
}

impl<E, V> Getter<E, V> {
    /// Reads the attribute. `None` means null.
    pub fn get<'a>(&self, entity: &'a E) -> Option<&'a V> {
        match self {
            Getter::Value(get) => Some(get(entity)),
            Getter::Nullable(get) => get(entity),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Getter::Nullable(_))
    }
}

impl<E, V> Clone for Getter<E, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, V> Copy for Getter<E, V> {}

impl<E, V> fmt::Debug for Getter<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Value(_) => f.write_str("Getter::Value"),
            Getter::Nullable(_) => f.write_str("Getter::Nullable"),
        }
    }
}

/// One attribute of record type `E`, holding values of type `V`.
///
/// Immutable and cheap to clone. Predicates and comparators keep their own
/// copy.
pub struct Field<E: 'static, V: FieldValue> {
    column: Cow<'static, str>,
    getter: Getter<E, V>,
    unique: bool,
}

impl<E: 'static, V: FieldValue> Field<E, V> {
    /// Creates a field whose getter always yields a value.
    ///
    /// Fails with [`FieldflowError::InvalidArgument`] if `column` is empty or blank.
    pub fn new(
        column: impl Into<Cow<'static, str>>,
        getter: ValueGetter<E, V>,
        unique: bool,
    ) -> Result<Self> {
        Self::checked(column.into(), Getter::Value(getter), unique)
    }

    /// Creates a field whose getter may yield null.
    ///
    /// Fails with [`FieldflowError::InvalidArgument`] if `column` is empty or blank.
    pub fn nullable(
        column: impl Into<Cow<'static, str>>,
        getter: NullableGetter<E, V>,
        unique: bool,
    ) -> Result<Self> {
        Self::checked(column.into(), Getter::Nullable(getter), unique)
    }

    fn checked(column: Cow<'static, str>, getter: Getter<E, V>, unique: bool) -> Result<Self> {
        if column.trim().is_empty() {
            warn!(
                table = std::any::type_name::<E>(),
                "rejecting field with blank column name"
            );
            return Err(FieldflowError::InvalidArgument {
                name: "column",
                reason: "must not be empty or blank",
            });
        }
        Ok(Field {
            column,
            getter,
            unique,
        })
    }

    #[doc(hidden)]
    pub const fn __derived(column: &'static str, getter: ValueGetter<E, V>, unique: bool) -> Self {
        Field {
            column: Cow::Borrowed(column),
            getter: Getter::Value(getter),
            unique,
        }
    }

    #[doc(hidden)]
    pub const fn __derived_nullable(
        column: &'static str,
        getter: NullableGetter<E, V>,
        unique: bool,
    ) -> Self {
        Field {
            column: Cow::Borrowed(column),
            getter: Getter::Nullable(getter),
            unique,
        }
    }

    /// The owning record type.
    pub fn table(&self) -> TypeTag {
        TypeTag::of::<E>()
    }

    pub fn column_name(&self) -> &str {
        &self.column
    }

    /// `true` if the attribute is a candidate key.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_nullable(&self) -> bool {
        self.getter.is_nullable()
    }

    pub fn kind(&self) -> ValueKind {
        V::KIND
    }

    pub fn getter(&self) -> Getter<E, V> {
        self.getter
    }

    /// Reads this attribute from a record. `None` means null.
    pub fn get<'a>(&self, entity: &'a E) -> Option<&'a V> {
        self.getter.get(entity)
    }

    fn predicate(&self, kind: PredicateType, operand: Operand<V>) -> FieldPredicate<E, V> {
        FieldPredicate::new(kind, self.clone(), operand)
    }

    pub fn equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::Equal, Operand::Value(Some(value)))
    }

    pub fn not_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::NotEqual, Operand::Value(Some(value)))
    }

    /// Like [`equal`](Field::equal), but `None` compares against null: it
    /// holds exactly when the attribute is null.
    pub fn equal_nullable(&self, value: Option<V>) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::Equal, Operand::Value(value))
    }

    pub fn not_equal_nullable(&self, value: Option<V>) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::NotEqual, Operand::Value(value))
    }

    /// Constant false for fields built with [`Field::new`].
    pub fn is_null(&self) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::IsNull, Operand::None)
    }

    pub fn is_not_null(&self) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::IsNotNull, Operand::None)
    }

    /// Ascending order, nulls last.
    pub fn comparator(&self) -> FieldComparator<E, V> {
        FieldComparator::new(self.clone(), NullOrder::Last)
    }

    /// Ascending order, nulls first.
    pub fn comparator_null_fields_first(&self) -> FieldComparator<E, V> {
        FieldComparator::new(self.clone(), NullOrder::First)
    }

    /// Descending order, nulls still last.
    pub fn reversed(&self) -> FieldComparator<E, V> {
        self.comparator().reversed()
    }
}

impl<E: 'static, V: OrderedValue> Field<E, V> {
    pub fn greater_than(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::GreaterThan, Operand::Value(Some(value)))
    }

    pub fn greater_or_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::GreaterOrEqual, Operand::Value(Some(value)))
    }

    pub fn less_than(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::LessThan, Operand::Value(Some(value)))
    }

    pub fn less_or_equal(&self, value: V) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::LessOrEqual, Operand::Value(Some(value)))
    }

    /// Values between `start` and `end`, bounds included per `inclusion`.
    pub fn between(&self, start: V, end: V, inclusion: Inclusion) -> FieldPredicate<E, V> {
        self.between_nullable(Some(start), Some(end), inclusion)
    }

    pub fn not_between(&self, start: V, end: V, inclusion: Inclusion) -> FieldPredicate<E, V> {
        self.not_between_nullable(Some(start), Some(end), inclusion)
    }

    /// Like [`between`](Field::between) with possibly-null bounds.
    ///
    /// A non-null value is never in range of a null bound. A null value is in
    /// range only on an inclusive side whose bound is also null.
    pub fn between_nullable(
        &self,
        start: Option<V>,
        end: Option<V>,
        inclusion: Inclusion,
    ) -> FieldPredicate<E, V> {
        self.predicate(
            PredicateType::Between,
            Operand::Range {
                start,
                end,
                inclusion,
            },
        )
    }

    pub fn not_between_nullable(
        &self,
        start: Option<V>,
        end: Option<V>,
        inclusion: Inclusion,
    ) -> FieldPredicate<E, V> {
        self.predicate(
            PredicateType::NotBetween,
            Operand::Range {
                start,
                end,
                inclusion,
            },
        )
    }

    /// Values in the given collection. Null is never a member.
    pub fn is_in<I>(&self, values: I) -> FieldPredicate<E, V>
    where
        I: IntoIterator<Item = V>,
    {
        self.is_in_set(ValueSet::new(values))
    }

    pub fn not_in<I>(&self, values: I) -> FieldPredicate<E, V>
    where
        I: IntoIterator<Item = V>,
    {
        self.not_in_set(ValueSet::new(values))
    }

    /// Values in a prebuilt set, which may include null.
    pub fn is_in_set(&self, set: ValueSet<V>) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::In, Operand::Set(set))
    }

    pub fn not_in_set(&self, set: ValueSet<V>) -> FieldPredicate<E, V> {
        self.predicate(PredicateType::NotIn, Operand::Set(set))
    }
}

impl<E: 'static> Field<E, String> {
    fn text(&self, kind: PredicateType, text: &str) -> FieldPredicate<E, String> {
        self.predicate(kind, Operand::Text(text.to_string()))
    }

    fn folded(&self, kind: PredicateType, text: &str) -> FieldPredicate<E, String> {
        self.predicate(kind, Operand::Text(fold_case(text)))
    }

    pub fn equal_ignore_case(&self, text: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::EqualIgnoreCase, text)
    }

    pub fn not_equal_ignore_case(&self, text: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::NotEqualIgnoreCase, text)
    }

    pub fn starts_with(&self, prefix: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::StartsWith, prefix)
    }

    pub fn not_starts_with(&self, prefix: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::NotStartsWith, prefix)
    }

    pub fn starts_with_ignore_case(&self, prefix: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::StartsWithIgnoreCase, prefix)
    }

    pub fn not_starts_with_ignore_case(&self, prefix: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::NotStartsWithIgnoreCase, prefix)
    }

    pub fn ends_with(&self, suffix: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::EndsWith, suffix)
    }

    pub fn not_ends_with(&self, suffix: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::NotEndsWith, suffix)
    }

    pub fn ends_with_ignore_case(&self, suffix: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::EndsWithIgnoreCase, suffix)
    }

    pub fn not_ends_with_ignore_case(&self, suffix: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::NotEndsWithIgnoreCase, suffix)
    }

    pub fn contains(&self, needle: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::Contains, needle)
    }

    pub fn not_contains(&self, needle: &str) -> FieldPredicate<E, String> {
        self.text(PredicateType::NotContains, needle)
    }

    pub fn contains_ignore_case(&self, needle: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::ContainsIgnoreCase, needle)
    }

    pub fn not_contains_ignore_case(&self, needle: &str) -> FieldPredicate<E, String> {
        self.folded(PredicateType::NotContainsIgnoreCase, needle)
    }

    /// Null or the empty string.
    pub fn is_empty(&self) -> FieldPredicate<E, String> {
        self.predicate(PredicateType::IsEmpty, Operand::None)
    }

    pub fn is_not_empty(&self) -> FieldPredicate<E, String> {
        self.predicate(PredicateType::IsNotEmpty, Operand::None)
    }

    /// Non-null values matching a regular expression (unanchored).
    pub fn matches(&self, pattern: &str) -> Result<FieldPredicate<E, String>> {
        Ok(self.predicate(PredicateType::Matches, Operand::Pattern(self.compile(pattern)?)))
    }

    pub fn not_matches(&self, pattern: &str) -> Result<FieldPredicate<E, String>> {
        Ok(self.predicate(
            PredicateType::NotMatches,
            Operand::Pattern(self.compile(pattern)?),
        ))
    }

    fn compile(&self, pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|err| {
            warn!(column = %self.column, error = %err, "rejecting invalid pattern");
            FieldflowError::from(err)
        })
    }
}

impl<E: 'static, V: FieldValue> Clone for Field<E, V> {
    fn clone(&self) -> Self {
        Field {
            column: self.column.clone(),
            getter: self.getter,
            unique: self.unique,
        }
    }
}

impl<E: 'static, V: FieldValue> fmt::Debug for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("table", &std::any::type_name::<E>())
            .field("column", &self.column)
            .field("kind", &V::KIND)
            .field("nullable", &self.is_nullable())
            .field("unique", &self.unique)
            .finish()
    }
}

impl<E: 'static, V: FieldValue> fmt::Display for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column)
    }
}
