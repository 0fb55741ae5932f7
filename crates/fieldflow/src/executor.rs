//! Running pipelines.
//!
//! The [`Executor`] trait is the boundary to whatever runs a sealed
//! [`Pipeline`]: a store translating stages into its own query form, or the
//! [`InMemoryExecutor`] here, which replays every stage over a `Vec`.

use tracing::debug;

use crate::error::{FieldflowError, Result};
use crate::pipeline::{rebox, unbox, unbox_all, Element, Elements, Pipeline};

/// Runs a pipeline against a data source.
pub trait Executor<R> {
    /// Where the root records come from.
    type Source;
    /// What a run produces.
    type Output;

    fn execute(&self, pipeline: &Pipeline<R>, source: Self::Source) -> Result<Self::Output>;
}

/// The result of running a pipeline in memory.
#[derive(Debug)]
pub enum Outcome {
    /// The transformed stream of a pipeline without a terminal stage.
    Elements(Elements),
    /// A `ForEach` terminal ran.
    Unit,
    /// The value of an `Apply` terminal (collect, reduce, find, min, max).
    Value(Element),
    /// The answer of a match terminal.
    Bool(bool),
    /// The answer of a count terminal.
    Count(usize),
}

impl Outcome {
    /// The stream as a `Vec<T>`.
    ///
    /// Accepts both an unterminated stream and the value of a `collect`.
    pub fn into_vec<T: 'static>(self) -> Result<Vec<T>> {
        match self {
            Outcome::Elements(elements) => unbox_all(elements),
            Outcome::Value(value) => unbox(value),
            _ => Err(FieldflowError::ElementType {
                expected: std::any::type_name::<Vec<T>>(),
            }),
        }
    }

    /// The value of an `Apply` terminal.
    pub fn into_value<T: 'static>(self) -> Result<T> {
        match self {
            Outcome::Value(value) => unbox(value),
            _ => Err(FieldflowError::ElementType {
                expected: std::any::type_name::<T>(),
            }),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Outcome::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<usize> {
        match self {
            Outcome::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Outcome::Unit)
    }
}

/// Replays a pipeline's stages eagerly over an in-memory `Vec<R>`.
///
/// Runs sequentially in encounter order regardless of
/// [`PipelineOptions`](crate::PipelineOptions). An empty pipeline returns the
/// source unchanged.
///
/// ```
/// use fieldflow::{Executor, Field, InMemoryExecutor, PipelineFactory, StandardPipelineFactory};
///
/// #[derive(Debug)]
/// struct Person { name: String, age: u8 }
///
/// fn age(p: &Person) -> &u8 { &p.age }
///
/// let age = Field::new("age", age, false)?;
/// let pipeline = StandardPipelineFactory::new()
///     .create_stream::<Person>()
///     .filter(age.less_than(30))
///     .map(|p: Person| p.name)
///     .collect();
///
/// let people = vec![
///     Person { name: "Ann".into(), age: 25 },
///     Person { name: "Bo".into(), age: 40 },
/// ];
/// let names: Vec<String> = InMemoryExecutor.execute(&pipeline, people)?.into_vec()?;
/// assert_eq!(names, ["Ann"]);
/// # Ok::<(), fieldflow::FieldflowError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryExecutor;

impl<R: Send + 'static> Executor<R> for InMemoryExecutor {
    type Source = Vec<R>;
    type Output = Outcome;

    fn execute(&self, pipeline: &Pipeline<R>, source: Vec<R>) -> Result<Outcome> {
        debug!(
            root = pipeline.root().name(),
            stages = pipeline.operations().len(),
            terminal = pipeline.terminal().map(|t| t.kind().as_str()),
            records = source.len(),
            "executing pipeline"
        );
        let mut elements = rebox(source);
        for operation in pipeline.operations() {
            elements = operation.apply(elements)?;
        }
        match pipeline.terminal() {
            Some(terminal) => terminal.apply(elements),
            None => Ok(Outcome::Elements(elements)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::pipeline::{
        IntermediateOperation, PipelineFactory, PipelineOptions, StandardPipelineFactory,
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        sensor: String,
        value: Option<f64>,
    }

    fn value(r: &Reading) -> Option<&f64> {
        r.value.as_ref()
    }

    fn reading(sensor: &str, value: Option<f64>) -> Reading {
        Reading {
            sensor: sensor.to_string(),
            value,
        }
    }

    fn readings() -> Vec<Reading> {
        vec![
            reading("a", Some(3.0)),
            reading("b", None),
            reading("c", Some(1.0)),
            reading("d", Some(2.0)),
        ]
    }

    #[test]
    fn empty_pipeline_returns_source() {
        let pipeline = Pipeline::<Reading>::new(PipelineOptions::default());
        let out = InMemoryExecutor.execute(&pipeline, readings()).unwrap();
        assert_eq!(out.into_vec::<Reading>().unwrap(), readings());
    }

    #[test]
    fn unterminated_pipeline_returns_transformed_stream() {
        let field = Field::nullable("value", value, false).unwrap();
        let mut pipeline = StandardPipelineFactory::new().create_pipeline::<Reading>();
        pipeline
            .append(IntermediateOperation::filter(field.is_not_null()))
            .unwrap()
            .append(IntermediateOperation::sorted(field.comparator()))
            .unwrap()
            .append(IntermediateOperation::map(|r: Reading| r.sensor))
            .unwrap();
        let out = InMemoryExecutor.execute(&pipeline, readings()).unwrap();
        assert_eq!(out.into_vec::<String>().unwrap(), ["c", "d", "a"]);
    }

    #[test]
    fn terminal_decides_outcome() {
        let field = Field::nullable("value", value, false).unwrap();
        let factory = StandardPipelineFactory::new();

        let count = factory
            .create_stream::<Reading>()
            .filter(field.greater_than(1.5))
            .count();
        let out = InMemoryExecutor.execute(&count, readings()).unwrap();
        assert_eq!(out.as_count(), Some(2));

        let any_null = factory.create_stream::<Reading>().any_match(field.is_null());
        let out = InMemoryExecutor.execute(&any_null, readings()).unwrap();
        assert_eq!(out.as_bool(), Some(true));

        let lowest = factory
            .create_stream::<Reading>()
            .min(field.comparator());
        let out = InMemoryExecutor.execute(&lowest, readings()).unwrap();
        assert_eq!(
            out.into_value::<Option<Reading>>().unwrap(),
            Some(reading("c", Some(1.0)))
        );
    }

    #[test]
    fn wrong_extraction_is_an_error() {
        let pipeline = StandardPipelineFactory::new()
            .create_stream::<Reading>()
            .count();
        let out = InMemoryExecutor.execute(&pipeline, readings()).unwrap();
        assert!(out.as_bool().is_none());
        assert!(matches!(
            out.into_value::<usize>(),
            Err(FieldflowError::ElementType { .. })
        ));
    }
}
