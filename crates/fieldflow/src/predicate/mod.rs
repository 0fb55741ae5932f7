//! Negatable boolean tests over records.
//!
//! A [`FieldPredicate`] is plain data: a [`PredicateType`] tag, the
//! [`Field`](crate::Field) it reads, and an [`Operand`]. Evaluation dispatches on
//! the tag, and every tag has an exact complement:
//!
//! | Positive | Negative |
//! |----------|----------|
//! | `AlwaysTrue` | `AlwaysFalse` |
//! | `IsNull` | `IsNotNull` |
//! | `Equal` | `NotEqual` |
//! | `GreaterThan` | `LessOrEqual` |
//! | `LessThan` | `GreaterOrEqual` |
//! | `Between` | `NotBetween` |
//! | `In` | `NotIn` |
//! | `EqualIgnoreCase` | `NotEqualIgnoreCase` |
//! | `StartsWith`, `EndsWith`, `Contains` (and `*IgnoreCase`) | `Not*` |
//! | `IsEmpty` | `IsNotEmpty` |
//! | `Matches` | `NotMatches` |
//!
//! The negative member is always evaluated as the negation of its positive
//! member, so `p.negate().test(r) == !p.test(r)` holds for every record,
//! including records whose field is null.
//!
//! Predicates of different value types are combined through the type-erased
//! [`Predicate`] trait and [`CombinedPredicate`].

mod combined;
mod field;
mod set;

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{FieldflowError, Result};

pub use combined::{CombinedPredicate, Combiner};
pub use field::{FieldPredicate, Operand};
pub(crate) use field::fold_case;
pub use set::ValueSet;

/// A type-erased, negatable test over values of type `T`.
pub trait Predicate<T>: fmt::Debug + Send + Sync {
    /// Evaluates this predicate against one item.
    fn test(&self, item: &T) -> bool;

    /// Returns the exact logical complement of this predicate.
    fn negated(&self) -> Arc<dyn Predicate<T>>;

    /// The tag of a single-field predicate, or `None` for composites.
    fn predicate_type(&self) -> Option<PredicateType> {
        None
    }

    /// Access to the concrete predicate, for executors that translate it.
    fn as_any(&self) -> &dyn Any;
}

impl<T, P> Predicate<T> for Arc<P>
where
    P: Predicate<T> + ?Sized,
{
    fn test(&self, item: &T) -> bool {
        (**self).test(item)
    }

    fn negated(&self) -> Arc<dyn Predicate<T>> {
        (**self).negated()
    }

    fn predicate_type(&self) -> Option<PredicateType> {
        (**self).predicate_type()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}

/// The kind of a field predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PredicateType {
    AlwaysTrue,
    AlwaysFalse,
    IsNull,
    IsNotNull,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    EqualIgnoreCase,
    NotEqualIgnoreCase,
    StartsWith,
    NotStartsWith,
    StartsWithIgnoreCase,
    NotStartsWithIgnoreCase,
    EndsWith,
    NotEndsWith,
    EndsWithIgnoreCase,
    NotEndsWithIgnoreCase,
    Contains,
    NotContains,
    ContainsIgnoreCase,
    NotContainsIgnoreCase,
    IsEmpty,
    IsNotEmpty,
    Matches,
    NotMatches,
}

impl PredicateType {
    /// Every predicate type, positive members first in each pair.
    pub const ALL: [PredicateType; 32] = [
        PredicateType::AlwaysTrue,
        PredicateType::AlwaysFalse,
        PredicateType::IsNull,
        PredicateType::IsNotNull,
        PredicateType::Equal,
        PredicateType::NotEqual,
        PredicateType::GreaterThan,
        PredicateType::LessOrEqual,
        PredicateType::LessThan,
        PredicateType::GreaterOrEqual,
        PredicateType::Between,
        PredicateType::NotBetween,
        PredicateType::In,
        PredicateType::NotIn,
        PredicateType::EqualIgnoreCase,
        PredicateType::NotEqualIgnoreCase,
        PredicateType::StartsWith,
        PredicateType::NotStartsWith,
        PredicateType::StartsWithIgnoreCase,
        PredicateType::NotStartsWithIgnoreCase,
        PredicateType::EndsWith,
        PredicateType::NotEndsWith,
        PredicateType::EndsWithIgnoreCase,
        PredicateType::NotEndsWithIgnoreCase,
        PredicateType::Contains,
        PredicateType::NotContains,
        PredicateType::ContainsIgnoreCase,
        PredicateType::NotContainsIgnoreCase,
        PredicateType::IsEmpty,
        PredicateType::IsNotEmpty,
        PredicateType::Matches,
        PredicateType::NotMatches,
    ];

    /// Returns the complementary predicate type.
    pub fn negate(self) -> PredicateType {
        match self {
            PredicateType::AlwaysTrue => PredicateType::AlwaysFalse,
            PredicateType::AlwaysFalse => PredicateType::AlwaysTrue,
            PredicateType::IsNull => PredicateType::IsNotNull,
            PredicateType::IsNotNull => PredicateType::IsNull,
            PredicateType::Equal => PredicateType::NotEqual,
            PredicateType::NotEqual => PredicateType::Equal,
            PredicateType::GreaterThan => PredicateType::LessOrEqual,
            PredicateType::LessOrEqual => PredicateType::GreaterThan,
            PredicateType::LessThan => PredicateType::GreaterOrEqual,
            PredicateType::GreaterOrEqual => PredicateType::LessThan,
            PredicateType::Between => PredicateType::NotBetween,
            PredicateType::NotBetween => PredicateType::Between,
            PredicateType::In => PredicateType::NotIn,
            PredicateType::NotIn => PredicateType::In,
            PredicateType::EqualIgnoreCase => PredicateType::NotEqualIgnoreCase,
            PredicateType::NotEqualIgnoreCase => PredicateType::EqualIgnoreCase,
            PredicateType::StartsWith => PredicateType::NotStartsWith,
            PredicateType::NotStartsWith => PredicateType::StartsWith,
            PredicateType::StartsWithIgnoreCase => PredicateType::NotStartsWithIgnoreCase,
            PredicateType::NotStartsWithIgnoreCase => PredicateType::StartsWithIgnoreCase,
            PredicateType::EndsWith => PredicateType::NotEndsWith,
            PredicateType::NotEndsWith => PredicateType::EndsWith,
            PredicateType::EndsWithIgnoreCase => PredicateType::NotEndsWithIgnoreCase,
            PredicateType::NotEndsWithIgnoreCase => PredicateType::EndsWithIgnoreCase,
            PredicateType::Contains => PredicateType::NotContains,
            PredicateType::NotContains => PredicateType::Contains,
            PredicateType::ContainsIgnoreCase => PredicateType::NotContainsIgnoreCase,
            PredicateType::NotContainsIgnoreCase => PredicateType::ContainsIgnoreCase,
            PredicateType::IsEmpty => PredicateType::IsNotEmpty,
            PredicateType::IsNotEmpty => PredicateType::IsEmpty,
            PredicateType::Matches => PredicateType::NotMatches,
            PredicateType::NotMatches => PredicateType::Matches,
        }
    }

    /// Returns `true` for the negative member of a complement pair.
    pub fn is_negated(self) -> bool {
        matches!(
            self,
            PredicateType::AlwaysFalse
                | PredicateType::IsNotNull
                | PredicateType::NotEqual
                | PredicateType::LessOrEqual
                | PredicateType::GreaterOrEqual
                | PredicateType::NotBetween
                | PredicateType::NotIn
                | PredicateType::NotEqualIgnoreCase
                | PredicateType::NotStartsWith
                | PredicateType::NotStartsWithIgnoreCase
                | PredicateType::NotEndsWith
                | PredicateType::NotEndsWithIgnoreCase
                | PredicateType::NotContains
                | PredicateType::NotContainsIgnoreCase
                | PredicateType::IsNotEmpty
                | PredicateType::NotMatches
        )
    }

    /// Returns the positive member of this type's pair.
    pub fn positive(self) -> PredicateType {
        if self.is_negated() {
            self.negate()
        } else {
            self
        }
    }

    /// Returns `true` for the string-only predicate types.
    pub fn is_string_op(self) -> bool {
        matches!(
            self.positive(),
            PredicateType::EqualIgnoreCase
                | PredicateType::StartsWith
                | PredicateType::StartsWithIgnoreCase
                | PredicateType::EndsWith
                | PredicateType::EndsWithIgnoreCase
                | PredicateType::Contains
                | PredicateType::ContainsIgnoreCase
                | PredicateType::IsEmpty
                | PredicateType::Matches
        )
    }

    /// Returns the display name of this predicate type.
    pub fn as_str(self) -> &'static str {
        match self {
            PredicateType::AlwaysTrue => "always_true",
            PredicateType::AlwaysFalse => "always_false",
            PredicateType::IsNull => "is_null",
            PredicateType::IsNotNull => "is_not_null",
            PredicateType::Equal => "equal",
            PredicateType::NotEqual => "not_equal",
            PredicateType::GreaterThan => "greater_than",
            PredicateType::GreaterOrEqual => "greater_or_equal",
            PredicateType::LessThan => "less_than",
            PredicateType::LessOrEqual => "less_or_equal",
            PredicateType::Between => "between",
            PredicateType::NotBetween => "not_between",
            PredicateType::In => "in",
            PredicateType::NotIn => "not_in",
            PredicateType::EqualIgnoreCase => "equal_ignore_case",
            PredicateType::NotEqualIgnoreCase => "not_equal_ignore_case",
            PredicateType::StartsWith => "starts_with",
            PredicateType::NotStartsWith => "not_starts_with",
            PredicateType::StartsWithIgnoreCase => "starts_with_ignore_case",
            PredicateType::NotStartsWithIgnoreCase => "not_starts_with_ignore_case",
            PredicateType::EndsWith => "ends_with",
            PredicateType::NotEndsWith => "not_ends_with",
            PredicateType::EndsWithIgnoreCase => "ends_with_ignore_case",
            PredicateType::NotEndsWithIgnoreCase => "not_ends_with_ignore_case",
            PredicateType::Contains => "contains",
            PredicateType::NotContains => "not_contains",
            PredicateType::ContainsIgnoreCase => "contains_ignore_case",
            PredicateType::NotContainsIgnoreCase => "not_contains_ignore_case",
            PredicateType::IsEmpty => "is_empty",
            PredicateType::IsNotEmpty => "is_not_empty",
            PredicateType::Matches => "matches",
            PredicateType::NotMatches => "not_matches",
        }
    }
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PredicateType {
    type Err = FieldflowError;

    /// Parses `equal`, `NOT_BETWEEN`, `Starts_With` and so on.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        PredicateType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FieldflowError::UnknownTag {
                kind: "predicate type",
                tag: s.to_string(),
            })
    }
}

/// Boundary policy of a range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Inclusion {
    /// `start < v < end`
    StartExclusiveEndExclusive,
    /// `start < v <= end`
    StartExclusiveEndInclusive,
    /// `start <= v < end`
    #[default]
    StartInclusiveEndExclusive,
    /// `start <= v <= end`
    StartInclusiveEndInclusive,
}

impl Inclusion {
    /// Builds the inclusion from per-bound flags.
    pub fn from_bounds(start_inclusive: bool, end_inclusive: bool) -> Self {
        match (start_inclusive, end_inclusive) {
            (false, false) => Inclusion::StartExclusiveEndExclusive,
            (false, true) => Inclusion::StartExclusiveEndInclusive,
            (true, false) => Inclusion::StartInclusiveEndExclusive,
            (true, true) => Inclusion::StartInclusiveEndInclusive,
        }
    }

    /// Returns `true` if a value equal to the start bound is in range.
    pub fn includes_start(self) -> bool {
        matches!(
            self,
            Inclusion::StartInclusiveEndExclusive | Inclusion::StartInclusiveEndInclusive
        )
    }

    /// Returns `true` if a value equal to the end bound is in range.
    pub fn includes_end(self) -> bool {
        matches!(
            self,
            Inclusion::StartExclusiveEndInclusive | Inclusion::StartInclusiveEndInclusive
        )
    }

    /// Returns the display name of this inclusion.
    pub fn as_str(self) -> &'static str {
        match self {
            Inclusion::StartExclusiveEndExclusive => "start_exclusive_end_exclusive",
            Inclusion::StartExclusiveEndInclusive => "start_exclusive_end_inclusive",
            Inclusion::StartInclusiveEndExclusive => "start_inclusive_end_exclusive",
            Inclusion::StartInclusiveEndInclusive => "start_inclusive_end_inclusive",
        }
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Inclusion {
    type Err = FieldflowError;

    /// Accepts the long names and the `ee`/`ei`/`ie`/`ii` shorthands.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ee" | "start_exclusive_end_exclusive" => Ok(Inclusion::StartExclusiveEndExclusive),
            "ei" | "start_exclusive_end_inclusive" => Ok(Inclusion::StartExclusiveEndInclusive),
            "ie" | "start_inclusive_end_exclusive" => Ok(Inclusion::StartInclusiveEndExclusive),
            "ii" | "start_inclusive_end_inclusive" => Ok(Inclusion::StartInclusiveEndInclusive),
            _ => Err(FieldflowError::UnknownTag {
                kind: "inclusion",
                tag: s.to_string(),
            }),
        }
    }
}
