//! Field-derived orderings over records.
//!
//! Provides [`NullOrder`] for null placement, [`FieldComparator`] for ordering
//! by one field, and [`CombinedComparator`] for tie-breaking chains.
//!
//! Direction and null placement are independent: reversing a comparator flips
//! the order of non-null values only, and nulls stay where [`NullOrder`] puts
//! them.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{FieldflowError, Result};
use crate::field::Field;
use crate::value::FieldValue;

/// Where null field values sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NullOrder {
    /// Nulls before every value.
    First,
    /// Nulls after every value.
    #[default]
    Last,
}

impl NullOrder {
    /// Ordering of a null against a non-null value.
    pub fn null_vs_value(self) -> Ordering {
        match self {
            NullOrder::First => Ordering::Less,
            NullOrder::Last => Ordering::Greater,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NullOrder::First => "first",
            NullOrder::Last => "last",
        }
    }
}

impl fmt::Display for NullOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NullOrder {
    type Err = FieldflowError;

    /// Accepts `first`/`last` and `nulls_first`/`nulls_last`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "nulls_first" => Ok(NullOrder::First),
            "last" | "nulls_last" => Ok(NullOrder::Last),
            _ => Err(FieldflowError::UnknownTag {
                kind: "null order",
                tag: s.to_string(),
            }),
        }
    }
}

/// A type-erased total ordering over values of type `T`.
pub trait Comparator<T>: fmt::Debug + Send + Sync {
    fn compare(&self, a: &T, b: &T) -> Ordering;

    /// Returns the comparator with the opposite direction.
    fn reverse(&self) -> Arc<dyn Comparator<T>>;

    /// Access to the concrete comparator, for executors that translate it.
    fn as_any(&self) -> &dyn Any;

    /// Stable-sorts a slice by this comparator.
    fn sort_slice(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl<T, C> Comparator<T> for Arc<C>
where
    C: Comparator<T> + ?Sized,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (**self).compare(a, b)
    }

    fn reverse(&self) -> Arc<dyn Comparator<T>> {
        (**self).reverse()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}

/// Orders records of type `E` by one field.
///
/// ```
/// use fieldflow::{Comparator, Field};
///
/// struct Row { n: Option<i32> }
///
/// fn n(r: &Row) -> Option<&i32> { r.n.as_ref() }
///
/// let field = Field::nullable("n", n, false)?;
/// let mut rows = vec![Row { n: None }, Row { n: Some(2) }, Row { n: Some(1) }];
///
/// field.reversed().sort_slice(&mut rows);
/// let order: Vec<_> = rows.iter().map(|r| r.n).collect();
/// assert_eq!(order, [Some(2), Some(1), None]);
/// # Ok::<(), fieldflow::FieldflowError>(())
/// ```
pub struct FieldComparator<E: 'static, V: FieldValue> {
    field: Field<E, V>,
    reversed: bool,
    null_order: NullOrder,
}

impl<E: 'static, V: FieldValue> FieldComparator<E, V> {
    /// Ascending order with the given null placement.
    pub fn new(field: Field<E, V>, null_order: NullOrder) -> Self {
        FieldComparator {
            field,
            reversed: false,
            null_order,
        }
    }

    pub fn field(&self) -> &Field<E, V> {
        &self.field
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn null_order(&self) -> NullOrder {
        self.null_order
    }

    /// Flips the direction of non-null values. Null placement is unchanged.
    pub fn reversed(&self) -> Self {
        FieldComparator {
            field: self.field.clone(),
            reversed: !self.reversed,
            null_order: self.null_order,
        }
    }

    pub fn with_null_order(mut self, null_order: NullOrder) -> Self {
        self.null_order = null_order;
        self
    }

    /// Breaks ties with another comparator.
    pub fn then_comparing<C>(self, next: C) -> CombinedComparator<E>
    where
        C: Comparator<E> + 'static,
    {
        CombinedComparator::new([Arc::new(self) as Arc<dyn Comparator<E>>, Arc::new(next)])
    }

    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        match (self.field.get(a), self.field.get(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => self.null_order.null_vs_value(),
            (Some(_), None) => self.null_order.null_vs_value().reverse(),
            (Some(x), Some(y)) => {
                let ordering = x.compare(y);
                if self.reversed {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
        }
    }
}

impl<E: 'static, V: FieldValue> Comparator<E> for FieldComparator<E, V> {
    fn compare(&self, a: &E, b: &E) -> Ordering {
        FieldComparator::compare(self, a, b)
    }

    fn reverse(&self) -> Arc<dyn Comparator<E>> {
        Arc::new(self.reversed())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<E: 'static, V: FieldValue> Clone for FieldComparator<E, V> {
    fn clone(&self) -> Self {
        FieldComparator {
            field: self.field.clone(),
            reversed: self.reversed,
            null_order: self.null_order,
        }
    }
}

impl<E: 'static, V: FieldValue> fmt::Debug for FieldComparator<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldComparator")
            .field("field", &self.field.column_name())
            .field("reversed", &self.reversed)
            .field("null_order", &self.null_order)
            .finish()
    }
}

impl<E: 'static, V: FieldValue> fmt::Display for FieldComparator<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.reversed { "desc" } else { "asc" };
        write!(
            f,
            "{} {dir} nulls {}",
            self.field.column_name(),
            self.null_order
        )
    }
}

/// A chain of comparators: the first non-equal result wins.
///
/// An empty chain considers everything equal.
pub struct CombinedComparator<T> {
    members: Vec<Arc<dyn Comparator<T>>>,
}

impl<T: 'static> CombinedComparator<T> {
    pub fn new<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Comparator<T>>>,
    {
        CombinedComparator {
            members: members.into_iter().collect(),
        }
    }

    pub fn members(&self) -> &[Arc<dyn Comparator<T>>] {
        &self.members
    }

    /// Appends a tie-breaker.
    pub fn then_comparing<C>(mut self, next: C) -> Self
    where
        C: Comparator<T> + 'static,
    {
        self.members.push(Arc::new(next));
        self
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.members
            .iter()
            .map(|c| c.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Reverses every member, keeping their order of precedence.
    pub fn reversed(&self) -> Self {
        CombinedComparator {
            members: self.members.iter().map(|c| c.reverse()).collect(),
        }
    }
}

impl<T: 'static> Comparator<T> for CombinedComparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        CombinedComparator::compare(self, a, b)
    }

    fn reverse(&self) -> Arc<dyn Comparator<T>> {
        Arc::new(self.reversed())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T> Clone for CombinedComparator<T> {
    fn clone(&self) -> Self {
        CombinedComparator {
            members: self.members.clone(),
        }
    }
}

impl<T> fmt::Debug for CombinedComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedComparator")
            .field("members", &self.members)
            .finish()
    }
}
