//! Terminal stream stages.
//!
//! Every [`TerminalOperationType`] has a fixed [`FunctionalType`] describing
//! what its function does with the stream: consume it, turn it into a value,
//! test it, or count it. [`TerminalOperation::new`] refuses a function whose
//! shape disagrees with the kind, so a mismatch never reaches an executor.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use super::operation::Argument;
use super::{unbox, unbox_all, view, Element, Elements};
use crate::comparator::Comparator;
use crate::error::{FieldflowError, Result};
use crate::executor::Outcome;
use crate::predicate::Predicate;
use crate::value::TypeTag;

/// The shape of a terminal stage's function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FunctionalType {
    /// Consumes the stream and returns nothing.
    Accept,
    /// Consumes the stream and produces a value.
    Apply,
    /// Consumes the stream and produces a boolean.
    ToBool,
    /// Consumes the stream and produces a count.
    ToCount,
}

impl FunctionalType {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionalType::Accept => "accept",
            FunctionalType::Apply => "apply",
            FunctionalType::ToBool => "to_bool",
            FunctionalType::ToCount => "to_count",
        }
    }
}

impl fmt::Display for FunctionalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of a terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TerminalOperationType {
    ForEach,
    Collect,
    Reduce,
    Count,
    AnyMatch,
    AllMatch,
    NoneMatch,
    FindFirst,
    Min,
    Max,
}

impl TerminalOperationType {
    pub const ALL: [TerminalOperationType; 10] = [
        TerminalOperationType::ForEach,
        TerminalOperationType::Collect,
        TerminalOperationType::Reduce,
        TerminalOperationType::Count,
        TerminalOperationType::AnyMatch,
        TerminalOperationType::AllMatch,
        TerminalOperationType::NoneMatch,
        TerminalOperationType::FindFirst,
        TerminalOperationType::Min,
        TerminalOperationType::Max,
    ];

    /// The function shape this kind requires.
    pub fn functional_type(self) -> FunctionalType {
        match self {
            TerminalOperationType::ForEach => FunctionalType::Accept,
            TerminalOperationType::Collect
            | TerminalOperationType::Reduce
            | TerminalOperationType::FindFirst
            | TerminalOperationType::Min
            | TerminalOperationType::Max => FunctionalType::Apply,
            TerminalOperationType::AnyMatch
            | TerminalOperationType::AllMatch
            | TerminalOperationType::NoneMatch => FunctionalType::ToBool,
            TerminalOperationType::Count => FunctionalType::ToCount,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerminalOperationType::ForEach => "for_each",
            TerminalOperationType::Collect => "collect",
            TerminalOperationType::Reduce => "reduce",
            TerminalOperationType::Count => "count",
            TerminalOperationType::AnyMatch => "any_match",
            TerminalOperationType::AllMatch => "all_match",
            TerminalOperationType::NoneMatch => "none_match",
            TerminalOperationType::FindFirst => "find_first",
            TerminalOperationType::Min => "min",
            TerminalOperationType::Max => "max",
        }
    }
}

impl fmt::Display for TerminalOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TerminalOperationType {
    type Err = FieldflowError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        TerminalOperationType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FieldflowError::UnknownTag {
                kind: "terminal operation",
                tag: s.to_string(),
            })
    }
}

/// The function a terminal stage runs, tagged with its shape.
#[derive(Clone)]
pub enum TerminalFunction {
    Accept(Arc<dyn Fn(Elements) -> Result<()> + Send + Sync>),
    Apply(Arc<dyn Fn(Elements) -> Result<Element> + Send + Sync>),
    ToBool(Arc<dyn Fn(Elements) -> Result<bool> + Send + Sync>),
    ToCount(Arc<dyn Fn(Elements) -> Result<usize> + Send + Sync>),
}

impl TerminalFunction {
    pub fn functional_type(&self) -> FunctionalType {
        match self {
            TerminalFunction::Accept(_) => FunctionalType::Accept,
            TerminalFunction::Apply(_) => FunctionalType::Apply,
            TerminalFunction::ToBool(_) => FunctionalType::ToBool,
            TerminalFunction::ToCount(_) => FunctionalType::ToCount,
        }
    }
}

impl fmt::Debug for TerminalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TerminalFunction::{:?}", self.functional_type())
    }
}

/// The stage that ends a pipeline.
#[derive(Clone)]
pub struct TerminalOperation {
    kind: TerminalOperationType,
    input: TypeTag,
    output: TypeTag,
    function: TerminalFunction,
    arguments: Vec<Argument>,
}

impl TerminalOperation {
    /// Builds a terminal stage from its parts.
    ///
    /// Fails with [`FieldflowError::FunctionalShapeMismatch`] if `function`
    /// does not have the shape `kind` requires.
    pub fn new(
        kind: TerminalOperationType,
        input: TypeTag,
        output: TypeTag,
        function: TerminalFunction,
        arguments: Vec<Argument>,
    ) -> Result<Self> {
        let expected = kind.functional_type();
        let actual = function.functional_type();
        if expected != actual {
            warn!(
                operation = %kind,
                expected = %expected,
                actual = %actual,
                "rejecting terminal function of the wrong shape"
            );
            return Err(FieldflowError::FunctionalShapeMismatch {
                operation: kind.as_str(),
                expected: expected.as_str(),
                actual: actual.as_str(),
            });
        }
        Ok(TerminalOperation {
            kind,
            input,
            output,
            function,
            arguments,
        })
    }

    fn assemble<T: 'static, O: 'static>(
        kind: TerminalOperationType,
        function: TerminalFunction,
        arguments: Vec<Argument>,
    ) -> Self {
        debug_assert_eq!(kind.functional_type(), function.functional_type());
        TerminalOperation {
            kind,
            input: TypeTag::of::<T>(),
            output: TypeTag::of::<O>(),
            function,
            arguments,
        }
    }

    /// Runs `action` on every element.
    pub fn for_each<T, F>(action: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let action: Arc<dyn Fn(T) + Send + Sync> = Arc::new(action);
        let run = Arc::clone(&action);
        Self::assemble::<T, ()>(
            TerminalOperationType::ForEach,
            TerminalFunction::Accept(Arc::new(move |elements: Elements| -> Result<()> {
                for item in unbox_all::<T>(elements)? {
                    run(item);
                }
                Ok(())
            })),
            vec![Argument::function(action)],
        )
    }

    /// Gathers the elements into a `Vec<T>`.
    pub fn collect<T: Send + 'static>() -> Self {
        Self::assemble::<T, Vec<T>>(
            TerminalOperationType::Collect,
            TerminalFunction::Apply(Arc::new(|elements: Elements| -> Result<Element> {
                Ok(Box::new(unbox_all::<T>(elements)?))
            })),
            Vec::new(),
        )
    }

    /// Counts the elements.
    pub fn count<T: 'static>() -> Self {
        Self::assemble::<T, usize>(
            TerminalOperationType::Count,
            TerminalFunction::ToCount(Arc::new(|elements: Elements| -> Result<usize> {
                Ok(elements.len())
            })),
            Vec::new(),
        )
    }

    /// Folds the elements into one `T`, starting from `identity`.
    ///
    /// The identity is kept as the first argument.
    pub fn reduce<T, F>(identity: T, accumulator: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let accumulator: Arc<dyn Fn(T, T) -> T + Send + Sync> = Arc::new(accumulator);
        let combine = Arc::clone(&accumulator);
        let seed = identity.clone();
        Self::assemble::<T, T>(
            TerminalOperationType::Reduce,
            TerminalFunction::Apply(Arc::new(move |elements: Elements| -> Result<Element> {
                let items = unbox_all::<T>(elements)?;
                let result = items.into_iter().fold(seed.clone(), |acc, item| combine(acc, item));
                Ok(Box::new(result))
            })),
            vec![
                Argument::Value(Arc::new(identity)),
                Argument::function(accumulator),
            ],
        )
    }

    /// Folds the elements pairwise; `None` for an empty stream.
    pub fn reduce_optional<T, F>(accumulator: F) -> Self
    where
        T: Send + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let accumulator: Arc<dyn Fn(T, T) -> T + Send + Sync> = Arc::new(accumulator);
        let combine = Arc::clone(&accumulator);
        Self::assemble::<T, Option<T>>(
            TerminalOperationType::Reduce,
            TerminalFunction::Apply(Arc::new(move |elements: Elements| -> Result<Element> {
                let items = unbox_all::<T>(elements)?;
                let result = items.into_iter().reduce(|acc, item| combine(acc, item));
                Ok(Box::new(result))
            })),
            vec![Argument::function(accumulator)],
        )
    }

    fn matching<T, P>(kind: TerminalOperationType, predicate: P) -> Self
    where
        T: 'static,
        P: Predicate<T> + 'static,
    {
        let predicate: Arc<dyn Predicate<T>> = Arc::new(predicate);
        let test = Arc::clone(&predicate);
        Self::assemble::<T, bool>(
            kind,
            TerminalFunction::ToBool(Arc::new(move |elements: Elements| -> Result<bool> {
                // Short-circuits on the first element that decides the answer.
                for element in &elements {
                    let hit = test.test(view::<T>(element)?);
                    match (kind, hit) {
                        (TerminalOperationType::AnyMatch, true) => return Ok(true),
                        (TerminalOperationType::AllMatch, false) => return Ok(false),
                        (TerminalOperationType::NoneMatch, true) => return Ok(false),
                        _ => {}
                    }
                }
                Ok(kind != TerminalOperationType::AnyMatch)
            })),
            vec![Argument::predicate(predicate)],
        )
    }

    /// `true` if any element matches. `false` for an empty stream.
    pub fn any_match<T, P>(predicate: P) -> Self
    where
        T: 'static,
        P: Predicate<T> + 'static,
    {
        Self::matching(TerminalOperationType::AnyMatch, predicate)
    }

    /// `true` if every element matches. `true` for an empty stream.
    pub fn all_match<T, P>(predicate: P) -> Self
    where
        T: 'static,
        P: Predicate<T> + 'static,
    {
        Self::matching(TerminalOperationType::AllMatch, predicate)
    }

    /// `true` if no element matches. `true` for an empty stream.
    pub fn none_match<T, P>(predicate: P) -> Self
    where
        T: 'static,
        P: Predicate<T> + 'static,
    {
        Self::matching(TerminalOperationType::NoneMatch, predicate)
    }

    /// The first element, as `Option<T>`.
    pub fn find_first<T: Send + 'static>() -> Self {
        Self::assemble::<T, Option<T>>(
            TerminalOperationType::FindFirst,
            TerminalFunction::Apply(Arc::new(|elements: Elements| -> Result<Element> {
                let first = elements.into_iter().next().map(unbox::<T>).transpose()?;
                Ok(Box::new(first))
            })),
            Vec::new(),
        )
    }

    /// The least element by `comparator`, as `Option<T>`. Ties keep the first.
    pub fn min<T, C>(comparator: C) -> Self
    where
        T: Send + 'static,
        C: Comparator<T> + 'static,
    {
        Self::extreme(TerminalOperationType::Min, comparator)
    }

    /// The greatest element by `comparator`, as `Option<T>`. Ties keep the last.
    pub fn max<T, C>(comparator: C) -> Self
    where
        T: Send + 'static,
        C: Comparator<T> + 'static,
    {
        Self::extreme(TerminalOperationType::Max, comparator)
    }

    fn extreme<T, C>(kind: TerminalOperationType, comparator: C) -> Self
    where
        T: Send + 'static,
        C: Comparator<T> + 'static,
    {
        let comparator: Arc<dyn Comparator<T>> = Arc::new(comparator);
        let order = Arc::clone(&comparator);
        Self::assemble::<T, Option<T>>(
            kind,
            TerminalFunction::Apply(Arc::new(move |elements: Elements| -> Result<Element> {
                let items = unbox_all::<T>(elements)?.into_iter();
                let found = if kind == TerminalOperationType::Min {
                    items.min_by(|a, b| order.compare(a, b))
                } else {
                    items.max_by(|a, b| order.compare(a, b))
                };
                Ok(Box::new(found))
            })),
            vec![Argument::comparator(comparator)],
        )
    }

    pub fn kind(&self) -> TerminalOperationType {
        self.kind
    }

    pub fn functional_type(&self) -> FunctionalType {
        self.function.functional_type()
    }

    /// Element type consumed by this stage.
    pub fn input_type(&self) -> TypeTag {
        self.input
    }

    /// Type of the value this stage produces.
    pub fn output_type(&self) -> TypeTag {
        self.output
    }

    pub fn function(&self) -> &TerminalFunction {
        &self.function
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Runs this stage over materialized elements.
    pub fn apply(&self, elements: Elements) -> Result<Outcome> {
        match &self.function {
            TerminalFunction::Accept(f) => f(elements).map(|()| Outcome::Unit),
            TerminalFunction::Apply(f) => f(elements).map(Outcome::Value),
            TerminalFunction::ToBool(f) => f(elements).map(Outcome::Bool),
            TerminalFunction::ToCount(f) => f(elements).map(Outcome::Count),
        }
    }
}

impl fmt::Debug for TerminalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalOperation")
            .field("kind", &self.kind)
            .field("input", &self.input.name())
            .field("output", &self.output.name())
            .field("function", &self.function)
            .field("arguments", &self.arguments)
            .finish()
    }
}
