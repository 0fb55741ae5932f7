//! Materialized value sets for `In`/`NotIn` predicates.

use std::cmp::Ordering;

use crate::value::FieldValue;

/// A deduplicated set of values, optionally containing null.
///
/// Input order is not preserved: values are kept sorted by
/// [`FieldValue::compare`] and looked up by binary search. Null membership is
/// never implied. It must be requested with [`with_null`](ValueSet::with_null)
/// or by passing `None` to [`from_nullable`](ValueSet::from_nullable).
#[derive(Debug, Clone)]
pub struct ValueSet<V> {
    values: Vec<V>,
    contains_null: bool,
}

impl<V: FieldValue> ValueSet<V> {
    /// Materializes a set from the given values. Duplicates collapse.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
    {
        let mut values: Vec<V> = values.into_iter().collect();
        values.sort_by(|a, b| a.compare(b));
        values.dedup_by(|a, b| a.value_eq(b));
        ValueSet {
            values,
            contains_null: false,
        }
    }

    /// Materializes a set where `None` stands for null.
    pub fn from_nullable<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<V>>,
    {
        let mut contains_null = false;
        let set = ValueSet::new(values.into_iter().filter_map(|v| {
            if v.is_none() {
                contains_null = true;
            }
            v
        }));
        ValueSet {
            contains_null,
            ..set
        }
    }

    /// Adds null to the set.
    pub fn with_null(mut self) -> Self {
        self.contains_null = true;
        self
    }

    /// Returns `true` if the value (or null, for `None`) is a member.
    pub fn contains(&self, value: Option<&V>) -> bool {
        match value {
            None => self.contains_null,
            Some(v) => self
                .values
                .binary_search_by(|probe| probe.compare(v))
                .is_ok(),
        }
    }

    /// Returns `true` if null is a member.
    pub fn contains_null(&self) -> bool {
        self.contains_null
    }

    /// Number of members, counting null once.
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.contains_null)
    }

    /// Returns `true` if the set has no members at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && !self.contains_null
    }

    /// The non-null members in ascending order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Returns `true` if both sets hold the same members.
    pub fn same_members(&self, other: &ValueSet<V>) -> bool {
        self.contains_null == other.contains_null
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.compare(b) == Ordering::Equal)
    }
}

impl<V: FieldValue> FromIterator<V> for ValueSet<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        ValueSet::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse_and_order_is_sorted() {
        let set = ValueSet::new([3, 1, 2, 3, 1]);
        assert_eq!(set.values(), &[1, 2, 3]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn membership() {
        let set: ValueSet<String> = ["Bo", "Ann", "Bo"].iter().map(|s| s.to_string()).collect();
        assert!(set.contains(Some(&"Ann".to_string())));
        assert!(set.contains(Some(&"Bo".to_string())));
        assert!(!set.contains(Some(&"Cy".to_string())));
        assert!(!set.contains(None));
    }

    #[test]
    fn null_is_only_a_member_when_requested() {
        let plain = ValueSet::new([1u8, 2]);
        assert!(!plain.contains_null());
        assert!(plain.clone().with_null().contains(None));

        let nullable = ValueSet::from_nullable([Some(1u8), None, Some(1)]);
        assert!(nullable.contains(None));
        assert!(nullable.contains(Some(&1)));
        assert_eq!(nullable.len(), 2);
    }

    #[test]
    fn empty_sets() {
        let empty: ValueSet<i64> = ValueSet::new([]);
        assert!(empty.is_empty());
        assert!(!empty.with_null().is_empty());
    }

    #[test]
    fn nan_is_a_single_member() {
        let set = ValueSet::new([f64::NAN, f64::NAN, 1.0]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Some(&f64::NAN)));
    }

    #[test]
    fn same_members_ignores_input_order() {
        let a = ValueSet::new([1, 2, 3]);
        let b = ValueSet::new([3, 2, 1, 2]);
        assert!(a.same_members(&b));
        assert!(!a.same_members(&b.clone().with_null()));
    }
}
