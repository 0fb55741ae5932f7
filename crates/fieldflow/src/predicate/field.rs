//! Single-field predicates.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::{CombinedPredicate, Inclusion, Predicate, PredicateType, ValueSet};
use crate::field::Field;
use crate::value::FieldValue;

/// The literal arguments a predicate is closed over.
///
/// `None` inside `Value` or `Range` stands for a null argument.
#[derive(Debug, Clone)]
pub enum Operand<V> {
    /// No argument (`IsNull`, `IsEmpty`, `AlwaysTrue`).
    None,
    /// One comparison value.
    Value(Option<V>),
    /// Range bounds and their inclusion policy.
    Range {
        start: Option<V>,
        end: Option<V>,
        inclusion: Inclusion,
    },
    /// Membership set.
    Set(ValueSet<V>),
    /// Text argument of a string predicate, lower-cased for the `*IgnoreCase` kinds.
    Text(String),
    /// Compiled pattern of `Matches`/`NotMatches`.
    Pattern(Regex),
}

/// A predicate over one [`Field`] of record type `E`.
///
/// Created by the operator methods on [`Field`]. Immutable once built.
///
/// # Example
///
/// ```
/// use fieldflow::{Field, Inclusion, PredicateType};
///
/// struct Person { age: i32 }
///
/// fn age(p: &Person) -> &i32 { &p.age }
///
/// let field = Field::new("age", age, false).unwrap();
/// let adult = field.between(18, 65, Inclusion::StartInclusiveEndInclusive);
///
/// assert!(adult.test(&Person { age: 18 }));
/// assert!(!adult.test(&Person { age: 66 }));
/// assert_eq!(adult.negate().predicate_type(), PredicateType::NotBetween);
/// assert!(adult.negate().test(&Person { age: 66 }));
/// ```
pub struct FieldPredicate<E: 'static, V: FieldValue> {
    kind: PredicateType,
    field: Field<E, V>,
    operand: Operand<V>,
}

impl<E: 'static, V: FieldValue> FieldPredicate<E, V> {
    pub(crate) fn new(kind: PredicateType, field: Field<E, V>, operand: Operand<V>) -> Self {
        FieldPredicate {
            kind,
            field,
            operand,
        }
    }

    /// The predicate's kind tag.
    pub fn predicate_type(&self) -> PredicateType {
        self.kind
    }

    /// The field this predicate reads.
    pub fn field(&self) -> &Field<E, V> {
        &self.field
    }

    /// The literal arguments.
    pub fn operand(&self) -> &Operand<V> {
        &self.operand
    }

    /// The inclusion policy of a range predicate.
    pub fn inclusion(&self) -> Option<Inclusion> {
        match &self.operand {
            Operand::Range { inclusion, .. } => Some(*inclusion),
            _ => None,
        }
    }

    /// Returns a new predicate of the complementary kind over the same field
    /// and arguments.
    pub fn negate(&self) -> Self {
        FieldPredicate {
            kind: self.kind.negate(),
            field: self.field.clone(),
            operand: self.operand.clone(),
        }
    }

    /// Evaluates this predicate against a record.
    pub fn test(&self, entity: &E) -> bool {
        let value = self.field.get(entity);
        let holds = self.test_positive(self.kind.positive(), value);
        holds != self.kind.is_negated()
    }

    /// Combines with another predicate; both must hold.
    pub fn and<P>(self, other: P) -> CombinedPredicate<E>
    where
        P: Predicate<E> + 'static,
    {
        CombinedPredicate::all_of([
            Arc::new(self) as Arc<dyn Predicate<E>>,
            Arc::new(other),
        ])
    }

    /// Combines with another predicate; at least one must hold.
    pub fn or<P>(self, other: P) -> CombinedPredicate<E>
    where
        P: Predicate<E> + 'static,
    {
        CombinedPredicate::any_of([
            Arc::new(self) as Arc<dyn Predicate<E>>,
            Arc::new(other),
        ])
    }

    fn test_positive(&self, kind: PredicateType, value: Option<&V>) -> bool {
        match (kind, &self.operand) {
            (PredicateType::AlwaysTrue, _) => true,
            (PredicateType::IsNull, _) => value.is_none(),

            (PredicateType::Equal, Operand::Value(arg)) => match (value, arg.as_ref()) {
                (None, None) => true,
                (Some(v), Some(a)) => v.value_eq(a),
                _ => false,
            },

            // Strict comparisons never hold against null; their complements
            // (LessOrEqual, GreaterOrEqual) therefore always do.
            (PredicateType::GreaterThan, Operand::Value(arg)) => {
                strictly(value, arg.as_ref(), Ordering::Greater)
            }
            (PredicateType::LessThan, Operand::Value(arg)) => {
                strictly(value, arg.as_ref(), Ordering::Less)
            }

            (
                PredicateType::Between,
                Operand::Range {
                    start,
                    end,
                    inclusion,
                },
            ) => in_range(value, start.as_ref(), end.as_ref(), *inclusion),

            (PredicateType::In, Operand::Set(set)) => set.contains(value),

            (PredicateType::IsEmpty, _) => match value {
                None => true,
                Some(v) => v.as_text().is_some_and(str::is_empty),
            },

            (PredicateType::Matches, Operand::Pattern(regex)) => {
                text_of(value).is_some_and(|t| regex.is_match(t))
            }

            (_, Operand::Text(arg)) => match text_of(value) {
                Some(text) => match_text(kind, text, arg),
                None => false,
            },

            // Kind and operand disagree; unreachable through the Field API.
            _ => false,
        }
    }
}

fn text_of<V: FieldValue>(value: Option<&V>) -> Option<&str> {
    value.and_then(FieldValue::as_text)
}

fn strictly<V: FieldValue>(value: Option<&V>, arg: Option<&V>, wanted: Ordering) -> bool {
    match (value, arg) {
        (Some(v), Some(a)) => v.compare(a) == wanted,
        _ => false,
    }
}

fn in_range<V: FieldValue>(
    value: Option<&V>,
    start: Option<&V>,
    end: Option<&V>,
    inclusion: Inclusion,
) -> bool {
    let Some(v) = value else {
        // Null is absent, not a value: it sits inside only the closed side of
        // a null bound.
        return match inclusion {
            Inclusion::StartExclusiveEndExclusive => false,
            Inclusion::StartInclusiveEndExclusive => start.is_none() && end.is_some(),
            Inclusion::StartExclusiveEndInclusive => start.is_some() && end.is_none(),
            Inclusion::StartInclusiveEndInclusive => start.is_none() || end.is_none(),
        };
    };

    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };

    let from_start = v.compare(start);
    let to_end = v.compare(end);

    let after_start = if inclusion.includes_start() {
        from_start != Ordering::Less
    } else {
        from_start == Ordering::Greater
    };
    let before_end = if inclusion.includes_end() {
        to_end != Ordering::Greater
    } else {
        to_end == Ordering::Less
    };

    after_start && before_end
}

/// Case-folds one char at a time: upper-case, then lower-case, keeping only
/// single-char mappings. `'İ'` folds to `'i'`, while `'ß'` stays `'ß'`.
pub(crate) fn fold_case(text: &str) -> String {
    text.chars().map(|c| simple_lower(simple_upper(c))).collect()
}

fn simple_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn simple_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn match_text(kind: PredicateType, text: &str, arg: &str) -> bool {
    match kind {
        PredicateType::EqualIgnoreCase => fold_case(text) == arg,
        PredicateType::StartsWith => text.starts_with(arg),
        PredicateType::StartsWithIgnoreCase => fold_case(text).starts_with(arg),
        PredicateType::EndsWith => text.ends_with(arg),
        PredicateType::EndsWithIgnoreCase => fold_case(text).ends_with(arg),
        PredicateType::Contains => text.contains(arg),
        PredicateType::ContainsIgnoreCase => fold_case(text).contains(arg),
        _ => false,
    }
}

impl<E: 'static, V: FieldValue> Predicate<E> for FieldPredicate<E, V> {
    fn test(&self, item: &E) -> bool {
        FieldPredicate::test(self, item)
    }

    fn negated(&self) -> Arc<dyn Predicate<E>> {
        Arc::new(self.negate())
    }

    fn predicate_type(&self) -> Option<PredicateType> {
        Some(self.kind)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<E: 'static, V: FieldValue> Clone for FieldPredicate<E, V> {
    fn clone(&self) -> Self {
        FieldPredicate {
            kind: self.kind,
            field: self.field.clone(),
            operand: self.operand.clone(),
        }
    }
}

impl<E: 'static, V: FieldValue> fmt::Debug for FieldPredicate<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPredicate")
            .field("kind", &self.kind)
            .field("field", &self.field)
            .field("operand", &self.operand)
            .finish()
    }
}

impl<E: 'static, V: FieldValue> fmt::Display for FieldPredicate<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field.column_name(), self.kind)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Value(v) => write!(f, " {}", Nullable(v.as_ref())),
            Operand::Range {
                start,
                end,
                inclusion,
            } => {
                let open = if inclusion.includes_start() { '[' } else { '(' };
                let close = if inclusion.includes_end() { ']' } else { ')' };
                write!(
                    f,
                    " {open}{}, {}{close}",
                    Nullable(start.as_ref()),
                    Nullable(end.as_ref())
                )
            }
            Operand::Set(set) => {
                write!(f, " {{")?;
                let mut first = true;
                if set.contains_null() {
                    write!(f, "null")?;
                    first = false;
                }
                for v in set.values() {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                    first = false;
                }
                write!(f, "}}")
            }
            Operand::Text(t) => write!(f, " {t:?}"),
            Operand::Pattern(r) => write!(f, " /{}/", r.as_str()),
        }
    }
}

struct Nullable<'a, V>(Option<&'a V>);

impl<V: fmt::Debug> fmt::Display for Nullable<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:?}"),
            None => write!(f, "null"),
        }
    }
}
