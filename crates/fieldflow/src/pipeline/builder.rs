//! Compile-time checked pipeline construction.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use super::{IntermediateOperation, Pipeline, TerminalOperation};
use crate::comparator::Comparator;
use crate::field::Field;
use crate::predicate::Predicate;
use crate::value::FieldValue;

/// Builds a [`Pipeline<R>`] whose stream currently carries `T`.
///
/// Each intermediate method consumes the builder and returns one typed by the
/// stage's output, so stages always chain. Terminal methods return the sealed
/// pipeline; [`build`](StreamBuilder::build) returns it unsealed.
///
/// ```
/// use fieldflow::{Field, PipelineFactory, StandardPipelineFactory, TerminalOperationType};
///
/// struct Person { name: String, age: u8 }
///
/// fn age(p: &Person) -> &u8 { &p.age }
///
/// let age = Field::new("age", age, false)?;
/// let pipeline = StandardPipelineFactory::new()
///     .create_stream::<Person>()
///     .filter(age.greater_than(20))
///     .sorted(age.reversed())
///     .map(|p: Person| p.name)
///     .limit(3)
///     .collect();
///
/// assert_eq!(pipeline.operations().len(), 4);
/// assert_eq!(pipeline.terminal().map(|t| t.kind()), Some(TerminalOperationType::Collect));
/// assert!(pipeline.current_type().is::<String>());
/// # Ok::<(), fieldflow::FieldflowError>(())
/// ```
pub struct StreamBuilder<R, T> {
    pipeline: Pipeline<R>,
    _current: PhantomData<fn() -> T>,
}

impl<R: 'static> StreamBuilder<R, R> {
    pub(crate) fn new(pipeline: Pipeline<R>) -> Self {
        debug_assert!(pipeline.is_empty());
        StreamBuilder {
            pipeline,
            _current: PhantomData,
        }
    }
}

impl<R: 'static, T: Send + 'static> StreamBuilder<R, T> {
    fn then<U>(mut self, operation: IntermediateOperation) -> StreamBuilder<R, U> {
        self.pipeline.push_unchecked(operation);
        StreamBuilder {
            pipeline: self.pipeline,
            _current: PhantomData,
        }
    }

    fn finish(mut self, operation: TerminalOperation) -> Pipeline<R> {
        self.pipeline.seal_unchecked(operation);
        self.pipeline
    }

    /// The pipeline built so far.
    pub fn pipeline(&self) -> &Pipeline<R> {
        &self.pipeline
    }

    pub fn filter<P>(self, predicate: P) -> StreamBuilder<R, T>
    where
        P: Predicate<T> + 'static,
    {
        self.then(IntermediateOperation::filter(predicate))
    }

    pub fn map<U, F>(self, mapper: F) -> StreamBuilder<R, U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.then(IntermediateOperation::map(mapper))
    }

    /// Projects onto `field`; null attributes become `None`.
    pub fn map_field<V: FieldValue>(self, field: Field<T, V>) -> StreamBuilder<R, Option<V>> {
        self.then(IntermediateOperation::map_field(field))
    }

    pub fn flat_map<U, I, F>(self, mapper: F) -> StreamBuilder<R, U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.then(IntermediateOperation::flat_map(mapper))
    }

    pub fn sorted<C>(self, comparator: C) -> StreamBuilder<R, T>
    where
        C: Comparator<T> + 'static,
    {
        self.then(IntermediateOperation::sorted(comparator))
    }

    pub fn sorted_natural(self) -> StreamBuilder<R, T>
    where
        T: Ord,
    {
        self.then(IntermediateOperation::sorted_natural::<T>())
    }

    pub fn distinct(self) -> StreamBuilder<R, T>
    where
        T: Eq + Hash + Clone,
    {
        self.then(IntermediateOperation::distinct::<T>())
    }

    pub fn limit(self, n: usize) -> StreamBuilder<R, T> {
        self.then(IntermediateOperation::limit::<T>(n))
    }

    pub fn skip(self, n: usize) -> StreamBuilder<R, T> {
        self.then(IntermediateOperation::skip::<T>(n))
    }

    pub fn peek<F>(self, action: F) -> StreamBuilder<R, T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.then(IntermediateOperation::peek(action))
    }

    pub fn take_while<P>(self, predicate: P) -> StreamBuilder<R, T>
    where
        P: Predicate<T> + 'static,
    {
        self.then(IntermediateOperation::take_while(predicate))
    }

    pub fn drop_while<P>(self, predicate: P) -> StreamBuilder<R, T>
    where
        P: Predicate<T> + 'static,
    {
        self.then(IntermediateOperation::drop_while(predicate))
    }

    /// Returns the pipeline without a terminal stage.
    pub fn build(self) -> Pipeline<R> {
        self.pipeline
    }

    pub fn for_each<F>(self, action: F) -> Pipeline<R>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.finish(TerminalOperation::for_each(action))
    }

    pub fn collect(self) -> Pipeline<R> {
        self.finish(TerminalOperation::collect::<T>())
    }

    pub fn count(self) -> Pipeline<R> {
        self.finish(TerminalOperation::count::<T>())
    }

    pub fn reduce<F>(self, identity: T, accumulator: F) -> Pipeline<R>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.finish(TerminalOperation::reduce(identity, accumulator))
    }

    pub fn reduce_optional<F>(self, accumulator: F) -> Pipeline<R>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        self.finish(TerminalOperation::reduce_optional(accumulator))
    }

    pub fn any_match<P>(self, predicate: P) -> Pipeline<R>
    where
        P: Predicate<T> + 'static,
    {
        self.finish(TerminalOperation::any_match(predicate))
    }

    pub fn all_match<P>(self, predicate: P) -> Pipeline<R>
    where
        P: Predicate<T> + 'static,
    {
        self.finish(TerminalOperation::all_match(predicate))
    }

    pub fn none_match<P>(self, predicate: P) -> Pipeline<R>
    where
        P: Predicate<T> + 'static,
    {
        self.finish(TerminalOperation::none_match(predicate))
    }

    pub fn find_first(self) -> Pipeline<R> {
        self.finish(TerminalOperation::find_first::<T>())
    }

    pub fn min<C>(self, comparator: C) -> Pipeline<R>
    where
        C: Comparator<T> + 'static,
    {
        self.finish(TerminalOperation::min(comparator))
    }

    pub fn max<C>(self, comparator: C) -> Pipeline<R>
    where
        C: Comparator<T> + 'static,
    {
        self.finish(TerminalOperation::max(comparator))
    }
}

impl<R, T> fmt::Debug for StreamBuilder<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuilder")
            .field("current", &std::any::type_name::<T>())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
