//! Intermediate stream stages.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use super::{rebox, unbox_all, view, Elements};
use crate::comparator::Comparator;
use crate::error::{FieldflowError, Result};
use crate::field::Field;
use crate::predicate::Predicate;
use crate::value::{FieldValue, TypeTag};

type StageFn = Arc<dyn Fn(Elements) -> Result<Elements> + Send + Sync>;

/// The kind of an intermediate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IntermediateOperationType {
    Filter,
    Map,
    FlatMap,
    Sorted,
    Distinct,
    Limit,
    Skip,
    Peek,
    TakeWhile,
    DropWhile,
}

impl IntermediateOperationType {
    pub const ALL: [IntermediateOperationType; 10] = [
        IntermediateOperationType::Filter,
        IntermediateOperationType::Map,
        IntermediateOperationType::FlatMap,
        IntermediateOperationType::Sorted,
        IntermediateOperationType::Distinct,
        IntermediateOperationType::Limit,
        IntermediateOperationType::Skip,
        IntermediateOperationType::Peek,
        IntermediateOperationType::TakeWhile,
        IntermediateOperationType::DropWhile,
    ];

    /// `true` if the stage emits the same element type it consumes.
    pub fn preserves_type(self) -> bool {
        !matches!(
            self,
            IntermediateOperationType::Map | IntermediateOperationType::FlatMap
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntermediateOperationType::Filter => "filter",
            IntermediateOperationType::Map => "map",
            IntermediateOperationType::FlatMap => "flat_map",
            IntermediateOperationType::Sorted => "sorted",
            IntermediateOperationType::Distinct => "distinct",
            IntermediateOperationType::Limit => "limit",
            IntermediateOperationType::Skip => "skip",
            IntermediateOperationType::Peek => "peek",
            IntermediateOperationType::TakeWhile => "take_while",
            IntermediateOperationType::DropWhile => "drop_while",
        }
    }
}

impl fmt::Display for IntermediateOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IntermediateOperationType {
    type Err = FieldflowError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        IntermediateOperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FieldflowError::UnknownTag {
                kind: "intermediate operation",
                tag: s.to_string(),
            })
    }
}

/// A literal or functional argument of a stage.
///
/// Functional arguments are stored type-erased. The typed accessors recover
/// them when the caller knows the element type:
///
/// | Variant | Holds |
/// |---------|-------|
/// | `Predicate` | `Arc<dyn Predicate<T>>` |
/// | `Comparator` | `Arc<dyn Comparator<T>>` |
/// | `Function` | `Arc<F>` for the stage's closure type `F` |
/// | `Field` | the projected `Field<E, V>` of a field `Map` |
/// | `Value` | any `T` |
#[derive(Clone)]
pub enum Argument {
    Count(usize),
    Value(Arc<dyn Any + Send + Sync>),
    Predicate(Arc<dyn Any + Send + Sync>),
    Comparator(Arc<dyn Any + Send + Sync>),
    Function(Arc<dyn Any + Send + Sync>),
    Field(Arc<dyn Any + Send + Sync>),
}

impl Argument {
    pub(crate) fn predicate<T: 'static>(predicate: Arc<dyn Predicate<T>>) -> Self {
        Argument::Predicate(Arc::new(predicate))
    }

    pub(crate) fn comparator<T: 'static>(comparator: Arc<dyn Comparator<T>>) -> Self {
        Argument::Comparator(Arc::new(comparator))
    }

    pub(crate) fn function<F: ?Sized + Send + Sync + 'static>(function: Arc<F>) -> Self {
        Argument::Function(Arc::new(function))
    }

    pub(crate) fn field<E: 'static, V: FieldValue>(field: Field<E, V>) -> Self {
        Argument::Field(Arc::new(field))
    }

    pub fn as_count(&self) -> Option<usize> {
        match self {
            Argument::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_value<T: 'static>(&self) -> Option<&T> {
        match self {
            Argument::Value(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The predicate of a `Filter`, `TakeWhile`, `DropWhile` or match stage.
    pub fn as_predicate<T: 'static>(&self) -> Option<&Arc<dyn Predicate<T>>> {
        match self {
            Argument::Predicate(p) => p.downcast_ref::<Arc<dyn Predicate<T>>>(),
            _ => None,
        }
    }

    /// The comparator of a `Sorted`, `Min` or `Max` stage.
    pub fn as_comparator<T: 'static>(&self) -> Option<&Arc<dyn Comparator<T>>> {
        match self {
            Argument::Comparator(c) => c.downcast_ref::<Arc<dyn Comparator<T>>>(),
            _ => None,
        }
    }

    /// The closure of a `Map`, `FlatMap`, `Peek`, `ForEach` or `Reduce` stage,
    /// e.g. `as_function::<dyn Fn(Person) -> String + Send + Sync>()`.
    pub fn as_function<F: ?Sized + 'static>(&self) -> Option<&Arc<F>> {
        match self {
            Argument::Function(f) => f.downcast_ref::<Arc<F>>(),
            _ => None,
        }
    }

    /// The attribute a [`map_field`](IntermediateOperation::map_field) stage
    /// projects.
    pub fn as_field<E: 'static, V: FieldValue>(&self) -> Option<&Field<E, V>> {
        match self {
            Argument::Field(f) => f.downcast_ref::<Field<E, V>>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Count(n) => f.debug_tuple("Count").field(n).finish(),
            Argument::Value(_) => f.write_str("Value(..)"),
            Argument::Predicate(_) => f.write_str("Predicate(..)"),
            Argument::Comparator(_) => f.write_str("Comparator(..)"),
            Argument::Function(_) => f.write_str("Function(..)"),
            Argument::Field(_) => f.write_str("Field(..)"),
        }
    }
}

/// A stage that turns one stream into another.
///
/// Built with the typed constructors, which record the element types and
/// arguments and capture the function the stage runs.
#[derive(Clone)]
pub struct IntermediateOperation {
    kind: IntermediateOperationType,
    input: TypeTag,
    output: TypeTag,
    arguments: Vec<Argument>,
    function: StageFn,
}

impl IntermediateOperation {
    fn same_type<T: 'static>(
        kind: IntermediateOperationType,
        arguments: Vec<Argument>,
        function: StageFn,
    ) -> Self {
        IntermediateOperation {
            kind,
            input: TypeTag::of::<T>(),
            output: TypeTag::of::<T>(),
            arguments,
            function,
        }
    }

    /// Keeps the elements matching `predicate`.
    pub fn filter<T, P>(predicate: P) -> Self
    where
        T: Send + 'static,
        P: Predicate<T> + 'static,
    {
        let predicate: Arc<dyn Predicate<T>> = Arc::new(predicate);
        let test = Arc::clone(&predicate);
        Self::same_type::<T>(
            IntermediateOperationType::Filter,
            vec![Argument::predicate(predicate)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                let mut kept = Vec::with_capacity(elements.len());
                for element in elements {
                    if test.test(view::<T>(&element)?) {
                        kept.push(element);
                    }
                }
                Ok(kept)
            }),
        )
    }

    /// Transforms each element.
    pub fn map<T, U, F>(mapper: F) -> Self
    where
        T: Send + 'static,
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let mapper: Arc<dyn Fn(T) -> U + Send + Sync> = Arc::new(mapper);
        let apply = Arc::clone(&mapper);
        IntermediateOperation {
            kind: IntermediateOperationType::Map,
            input: TypeTag::of::<T>(),
            output: TypeTag::of::<U>(),
            arguments: vec![Argument::function(mapper)],
            function: Arc::new(move |elements: Elements| -> Result<Elements> {
                let items = unbox_all::<T>(elements)?;
                Ok(rebox(items.into_iter().map(|item| apply(item)).collect()))
            }),
        }
    }

    /// Projects each record onto one attribute, null as `None`.
    ///
    /// Unlike [`map`](IntermediateOperation::map), the field itself is the
    /// stage's argument, so an executor can tell which column is read.
    pub fn map_field<E, V>(field: Field<E, V>) -> Self
    where
        E: Send + 'static,
        V: FieldValue,
    {
        let project = field.clone();
        IntermediateOperation {
            kind: IntermediateOperationType::Map,
            input: TypeTag::of::<E>(),
            output: TypeTag::of::<Option<V>>(),
            arguments: vec![Argument::field(field)],
            function: Arc::new(move |elements: Elements| -> Result<Elements> {
                let mut projected = Vec::with_capacity(elements.len());
                for element in &elements {
                    projected.push(project.get(view::<E>(element)?).cloned());
                }
                Ok(rebox(projected))
            }),
        }
    }

    /// Replaces each element with zero or more elements.
    pub fn flat_map<T, U, I, F>(mapper: F) -> Self
    where
        T: Send + 'static,
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        let mapper: Arc<dyn Fn(T) -> Vec<U> + Send + Sync> =
            Arc::new(move |item: T| -> Vec<U> { mapper(item).into_iter().collect() });
        let apply = Arc::clone(&mapper);
        IntermediateOperation {
            kind: IntermediateOperationType::FlatMap,
            input: TypeTag::of::<T>(),
            output: TypeTag::of::<U>(),
            arguments: vec![Argument::function(mapper)],
            function: Arc::new(move |elements: Elements| -> Result<Elements> {
                let items = unbox_all::<T>(elements)?;
                Ok(rebox(items.into_iter().flat_map(|item| apply(item)).collect()))
            }),
        }
    }

    /// Stable-sorts by `comparator`.
    pub fn sorted<T, C>(comparator: C) -> Self
    where
        T: Send + 'static,
        C: Comparator<T> + 'static,
    {
        let comparator: Arc<dyn Comparator<T>> = Arc::new(comparator);
        let order = Arc::clone(&comparator);
        Self::same_type::<T>(
            IntermediateOperationType::Sorted,
            vec![Argument::comparator(comparator)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                let mut items = unbox_all::<T>(elements)?;
                order.sort_slice(&mut items);
                Ok(rebox(items))
            }),
        )
    }

    /// Stable-sorts by the natural order of `T`.
    pub fn sorted_natural<T>() -> Self
    where
        T: Ord + Send + 'static,
    {
        Self::same_type::<T>(
            IntermediateOperationType::Sorted,
            Vec::new(),
            Arc::new(|elements: Elements| -> Result<Elements> {
                let mut items = unbox_all::<T>(elements)?;
                items.sort();
                Ok(rebox(items))
            }),
        )
    }

    /// Drops repeated elements, keeping the first occurrence.
    pub fn distinct<T>() -> Self
    where
        T: Eq + Hash + Clone + Send + 'static,
    {
        Self::same_type::<T>(
            IntermediateOperationType::Distinct,
            Vec::new(),
            Arc::new(|elements: Elements| -> Result<Elements> {
                let mut seen = HashSet::new();
                let mut kept = Vec::with_capacity(elements.len());
                for element in elements {
                    if seen.insert(view::<T>(&element)?.clone()) {
                        kept.push(element);
                    }
                }
                Ok(kept)
            }),
        )
    }

    /// Keeps at most the first `n` elements.
    pub fn limit<T: Send + 'static>(n: usize) -> Self {
        Self::same_type::<T>(
            IntermediateOperationType::Limit,
            vec![Argument::Count(n)],
            Arc::new(move |mut elements: Elements| -> Result<Elements> {
                elements.truncate(n);
                Ok(elements)
            }),
        )
    }

    /// Discards the first `n` elements.
    pub fn skip<T: Send + 'static>(n: usize) -> Self {
        Self::same_type::<T>(
            IntermediateOperationType::Skip,
            vec![Argument::Count(n)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                Ok(elements.into_iter().skip(n).collect())
            }),
        )
    }

    /// Observes each element without changing the stream.
    pub fn peek<T, F>(action: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let action: Arc<dyn Fn(&T) + Send + Sync> = Arc::new(action);
        let observe = Arc::clone(&action);
        Self::same_type::<T>(
            IntermediateOperationType::Peek,
            vec![Argument::function(action)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                for element in &elements {
                    observe(view::<T>(element)?);
                }
                Ok(elements)
            }),
        )
    }

    /// Keeps the longest prefix whose elements match `predicate`.
    pub fn take_while<T, P>(predicate: P) -> Self
    where
        T: Send + 'static,
        P: Predicate<T> + 'static,
    {
        let predicate: Arc<dyn Predicate<T>> = Arc::new(predicate);
        let test = Arc::clone(&predicate);
        Self::same_type::<T>(
            IntermediateOperationType::TakeWhile,
            vec![Argument::predicate(predicate)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                let mut kept = Vec::new();
                for element in elements {
                    if !test.test(view::<T>(&element)?) {
                        break;
                    }
                    kept.push(element);
                }
                Ok(kept)
            }),
        )
    }

    /// Drops the longest prefix whose elements match `predicate`.
    pub fn drop_while<T, P>(predicate: P) -> Self
    where
        T: Send + 'static,
        P: Predicate<T> + 'static,
    {
        let predicate: Arc<dyn Predicate<T>> = Arc::new(predicate);
        let test = Arc::clone(&predicate);
        Self::same_type::<T>(
            IntermediateOperationType::DropWhile,
            vec![Argument::predicate(predicate)],
            Arc::new(move |elements: Elements| -> Result<Elements> {
                let mut kept = Vec::new();
                let mut dropping = true;
                for element in elements {
                    if dropping && test.test(view::<T>(&element)?) {
                        continue;
                    }
                    dropping = false;
                    kept.push(element);
                }
                Ok(kept)
            }),
        )
    }

    pub fn kind(&self) -> IntermediateOperationType {
        self.kind
    }

    /// Element type consumed by this stage.
    pub fn input_type(&self) -> TypeTag {
        self.input
    }

    /// Element type produced by this stage.
    pub fn output_type(&self) -> TypeTag {
        self.output
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Runs this stage over materialized elements.
    ///
    /// Fails with [`FieldflowError::ElementType`] if an element is not of the
    /// declared input type.
    pub fn apply(&self, elements: Elements) -> Result<Elements> {
        (self.function)(elements)
    }
}

impl fmt::Debug for IntermediateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntermediateOperation")
            .field("kind", &self.kind)
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .field("arguments", &self.arguments)
            .finish()
    }
}
