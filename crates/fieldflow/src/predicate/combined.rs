//! AND/OR composition of predicates.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::Predicate;

/// How the members of a [`CombinedPredicate`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Combiner {
    And,
    Or,
}

impl Combiner {
    /// The dual combiner, used when negating.
    pub fn flip(self) -> Combiner {
        match self {
            Combiner::And => Combiner::Or,
            Combiner::Or => Combiner::And,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Combiner::And => "and",
            Combiner::Or => "or",
        }
    }
}

impl fmt::Display for Combiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A predicate built from other predicates joined by AND or OR.
///
/// Members may read different fields and have different value types. An empty
/// AND holds for everything; an empty OR holds for nothing. Evaluation
/// short-circuits in member order.
///
/// Negation applies De Morgan: the result uses the dual combiner over the
/// negated members.
pub struct CombinedPredicate<T> {
    combiner: Combiner,
    members: Vec<Arc<dyn Predicate<T>>>,
}

impl<T: 'static> CombinedPredicate<T> {
    pub fn new<I>(combiner: Combiner, members: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Predicate<T>>>,
    {
        CombinedPredicate {
            combiner,
            members: members.into_iter().collect(),
        }
    }

    /// All members must hold.
    pub fn all_of<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Predicate<T>>>,
    {
        CombinedPredicate::new(Combiner::And, members)
    }

    /// At least one member must hold.
    pub fn any_of<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Predicate<T>>>,
    {
        CombinedPredicate::new(Combiner::Or, members)
    }

    pub fn combiner(&self) -> Combiner {
        self.combiner
    }

    pub fn members(&self) -> &[Arc<dyn Predicate<T>>] {
        &self.members
    }

    pub fn test(&self, item: &T) -> bool {
        match self.combiner {
            Combiner::And => self.members.iter().all(|p| p.test(item)),
            Combiner::Or => self.members.iter().any(|p| p.test(item)),
        }
    }

    /// Returns the De Morgan complement.
    pub fn negate(&self) -> Self {
        CombinedPredicate {
            combiner: self.combiner.flip(),
            members: self.members.iter().map(|p| p.negated()).collect(),
        }
    }

    /// Joins another predicate with AND.
    ///
    /// An AND combination absorbs the new member instead of nesting.
    pub fn and<P>(self, other: P) -> Self
    where
        P: Predicate<T> + 'static,
    {
        self.join(Combiner::And, Arc::new(other))
    }

    /// Joins another predicate with OR.
    ///
    /// An OR combination absorbs the new member instead of nesting.
    pub fn or<P>(self, other: P) -> Self
    where
        P: Predicate<T> + 'static,
    {
        self.join(Combiner::Or, Arc::new(other))
    }

    fn join(mut self, combiner: Combiner, other: Arc<dyn Predicate<T>>) -> Self {
        if self.combiner == combiner {
            self.members.push(other);
            self
        } else {
            CombinedPredicate::new(combiner, [Arc::new(self) as Arc<dyn Predicate<T>>, other])
        }
    }
}

impl<T: 'static> Predicate<T> for CombinedPredicate<T> {
    fn test(&self, item: &T) -> bool {
        CombinedPredicate::test(self, item)
    }

    fn negated(&self) -> Arc<dyn Predicate<T>> {
        Arc::new(self.negate())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T> Clone for CombinedPredicate<T> {
    fn clone(&self) -> Self {
        CombinedPredicate {
            combiner: self.combiner,
            members: self.members.clone(),
        }
    }
}

impl<T> fmt::Debug for CombinedPredicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedPredicate")
            .field("combiner", &self.combiner)
            .field("members", &self.members)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[derive(Debug)]
    struct Item {
        a: i32,
        b: String,
    }

    fn a(i: &Item) -> &i32 {
        &i.a
    }

    fn b(i: &Item) -> &String {
        &i.b
    }

    fn item(a: i32, b: &str) -> Item {
        Item {
            a,
            b: b.to_string(),
        }
    }

    fn fields() -> (Field<Item, i32>, Field<Item, String>) {
        (
            Field::new("a", a, false).unwrap(),
            Field::new("b", b, false).unwrap(),
        )
    }

    #[test]
    fn empty_combinations() {
        let all: CombinedPredicate<Item> = CombinedPredicate::all_of([]);
        let any: CombinedPredicate<Item> = CombinedPredicate::any_of([]);
        assert!(all.test(&item(0, "")));
        assert!(!any.test(&item(0, "")));
        assert!(!all.negate().test(&item(0, "")));
        assert!(any.negate().test(&item(0, "")));
    }

    #[test]
    fn mixes_value_types() {
        let (fa, fb) = fields();
        let p = fa.greater_than(1).and(fb.starts_with("x"));
        assert_eq!(p.combiner(), Combiner::And);
        assert!(p.test(&item(2, "xy")));
        assert!(!p.test(&item(2, "yx")));
        assert!(!p.test(&item(1, "xy")));

        let q = fa.equal(0).or(fb.equal("z".to_string()));
        assert!(q.test(&item(0, "a")));
        assert!(q.test(&item(5, "z")));
        assert!(!q.test(&item(5, "a")));
    }

    #[test]
    fn de_morgan_negation() {
        let (fa, fb) = fields();
        let p = fa.greater_than(1).and(fb.contains("q"));
        let n = p.negate();
        assert_eq!(n.combiner(), Combiner::Or);
        for it in [item(0, "q"), item(2, "q"), item(2, "z"), item(0, "z")] {
            assert_eq!(n.test(&it), !p.test(&it), "{it:?}");
        }
    }

    #[test]
    fn same_combiner_flattens() {
        let (fa, fb) = fields();
        let p = fa.greater_than(0).and(fb.is_not_empty()).and(fa.less_than(9));
        assert_eq!(p.members().len(), 3);

        let q = p.or(fa.equal(100));
        assert_eq!(q.combiner(), Combiner::Or);
        assert_eq!(q.members().len(), 2);
        assert!(q.test(&item(100, "")));
        assert!(q.test(&item(5, "x")));
        assert!(!q.test(&item(5, "")));
    }

    #[test]
    fn composites_have_no_single_type() {
        let (fa, _) = fields();
        let p: Arc<dyn Predicate<Item>> = Arc::new(fa.equal(1).or(fa.equal(2)));
        assert_eq!(p.predicate_type(), None);
        assert!(p.as_any().is::<CombinedPredicate<Item>>());
    }
}
