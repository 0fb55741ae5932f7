//! Reified stream pipelines.
//!
//! A [`Pipeline<R>`] is an inspectable description of a stream computation over
//! records of type `R`: an ordered list of [`IntermediateOperation`]s capped by
//! at most one [`TerminalOperation`]. Every stage carries its declared input and
//! output element types, its kind tag and its arguments, so an
//! [`Executor`](crate::Executor) can either replay the stages or translate them.
//!
//! Stages are appended in two ways:
//!
//! - [`Pipeline::append`] / [`Pipeline::set_terminal`] check the type chain at
//!   runtime and fail with [`FieldflowError::TypeMismatch`] or
//!   [`FieldflowError::PipelineSealed`].
//! - [`StreamBuilder`] tracks the current element type as a type parameter, so
//!   a mis-chained stage does not compile.
//!
//! ```
//! use fieldflow::{Field, IntermediateOperation, PipelineFactory, StandardPipelineFactory};
//!
//! struct Person { age: u8 }
//!
//! fn age(p: &Person) -> &u8 { &p.age }
//!
//! let age = Field::new("age", age, false)?;
//! let mut pipeline = StandardPipelineFactory::new().create_pipeline::<Person>();
//!
//! pipeline
//!     .append(IntermediateOperation::filter(age.greater_or_equal(18)))?
//!     .append(IntermediateOperation::map(|p: Person| p.age))?;
//!
//! // The stream now carries u8, so a Person stage is rejected.
//! assert!(pipeline.append(IntermediateOperation::limit::<Person>(1)).is_err());
//! assert_eq!(pipeline.operations().len(), 2);
//! # Ok::<(), fieldflow::FieldflowError>(())
//! ```

mod builder;
mod factory;
mod operation;
mod terminal;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::error::{FieldflowError, Result};
use crate::value::TypeTag;

pub use builder::StreamBuilder;
pub use factory::{PipelineFactory, PipelineOptions, StandardPipelineFactory};
pub use operation::{Argument, IntermediateOperation, IntermediateOperationType};
pub use terminal::{FunctionalType, TerminalFunction, TerminalOperation, TerminalOperationType};

/// One type-erased stream element.
pub type Element = Box<dyn Any + Send>;

/// A materialized stream of type-erased elements.
pub type Elements = Vec<Element>;

pub(crate) fn view<T: 'static>(element: &Element) -> Result<&T> {
    (**element)
        .downcast_ref::<T>()
        .ok_or(FieldflowError::ElementType {
            expected: std::any::type_name::<T>(),
        })
}

pub(crate) fn unbox<T: 'static>(element: Element) -> Result<T> {
    element
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| FieldflowError::ElementType {
            expected: std::any::type_name::<T>(),
        })
}

pub(crate) fn unbox_all<T: 'static>(elements: Elements) -> Result<Vec<T>> {
    elements.into_iter().map(unbox).collect()
}

pub(crate) fn rebox<T: Send + 'static>(items: Vec<T>) -> Elements {
    items
        .into_iter()
        .map(|item| Box::new(item) as Element)
        .collect()
}

/// An append-only, type-chained sequence of stream stages rooted at `R`.
pub struct Pipeline<R> {
    root: TypeTag,
    current: TypeTag,
    options: PipelineOptions,
    operations: Vec<IntermediateOperation>,
    terminal: Option<TerminalOperation>,
    _root: PhantomData<fn() -> R>,
}

impl<R: 'static> Pipeline<R> {
    /// Creates an empty pipeline whose stream carries `R`.
    pub fn new(options: PipelineOptions) -> Self {
        let root = TypeTag::of::<R>();
        debug!(
            root = root.name(),
            ordered = options.ordered,
            parallel = options.parallel,
            "created pipeline"
        );
        Pipeline {
            root,
            current: root,
            options,
            operations: Vec::new(),
            terminal: None,
            _root: PhantomData,
        }
    }

    /// Appends an intermediate stage.
    ///
    /// The stage's input type must equal the current element type, and the
    /// pipeline must not be sealed. On success the current element type
    /// becomes the stage's output type.
    pub fn append(&mut self, operation: IntermediateOperation) -> Result<&mut Self> {
        self.check_open()?;
        self.check_input(operation.input_type())?;
        self.push_unchecked(operation);
        Ok(self)
    }

    /// Sets the terminal stage, sealing the pipeline.
    pub fn set_terminal(&mut self, operation: TerminalOperation) -> Result<&mut Self> {
        self.check_open()?;
        self.check_input(operation.input_type())?;
        self.seal_unchecked(operation);
        Ok(self)
    }

    pub(crate) fn push_unchecked(&mut self, operation: IntermediateOperation) {
        trace!(
            position = self.operations.len(),
            operation = %operation.kind(),
            input = operation.input_type().name(),
            output = operation.output_type().name(),
            "appended stage"
        );
        self.current = operation.output_type();
        self.operations.push(operation);
    }

    pub(crate) fn seal_unchecked(&mut self, operation: TerminalOperation) {
        debug!(
            root = self.root.name(),
            stages = self.operations.len(),
            terminal = %operation.kind(),
            "sealed pipeline"
        );
        self.terminal = Some(operation);
    }

    fn check_open(&self) -> Result<()> {
        match &self.terminal {
            Some(terminal) => {
                warn!(
                    root = self.root.name(),
                    terminal = %terminal.kind(),
                    "rejecting stage on sealed pipeline"
                );
                Err(FieldflowError::PipelineSealed {
                    terminal: terminal.kind().as_str(),
                })
            }
            None => Ok(()),
        }
    }

    fn check_input(&self, input: TypeTag) -> Result<()> {
        if input == self.current {
            return Ok(());
        }
        warn!(
            position = self.operations.len(),
            expected = input.name(),
            actual = self.current.name(),
            "rejecting mis-chained stage"
        );
        Err(FieldflowError::TypeMismatch {
            position: self.operations.len(),
            expected: input.name(),
            actual: self.current.name(),
        })
    }

    /// The record type the pipeline starts from.
    pub fn root(&self) -> TypeTag {
        self.root
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// The intermediate stages, in order.
    pub fn operations(&self) -> &[IntermediateOperation] {
        &self.operations
    }

    /// The terminal stage, if the pipeline is sealed.
    pub fn terminal(&self) -> Option<&TerminalOperation> {
        self.terminal.as_ref()
    }

    /// The element type produced by the last intermediate stage.
    pub fn current_type(&self) -> TypeTag {
        self.current
    }

    pub fn is_sealed(&self) -> bool {
        self.terminal.is_some()
    }

    /// `true` if there are no stages at all.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.terminal.is_none()
    }
}

impl<R> fmt::Debug for Pipeline<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("current", &self.current)
            .field("options", &self.options)
            .field("operations", &self.operations)
            .field("terminal", &self.terminal)
            .finish()
    }
}

impl<R> fmt::Display for Pipeline<R> {
    /// Renders the stage chain, e.g. `Person | filter | sorted | collect`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for operation in &self.operations {
            write!(f, " | {}", operation.kind())?;
        }
        if let Some(terminal) = &self.terminal {
            write!(f, " | {}", terminal.kind())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: String,
        age: u8,
    }

    fn age(p: &Person) -> &u8 {
        &p.age
    }

    fn fresh() -> Pipeline<Person> {
        Pipeline::new(PipelineOptions::default())
    }

    #[test]
    fn fresh_pipeline_is_empty() {
        let p = fresh();
        assert!(p.is_empty());
        assert!(p.operations().is_empty());
        assert!(p.terminal().is_none());
        assert!(!p.is_sealed());
        assert_eq!(p.root(), TypeTag::of::<Person>());
        assert_eq!(p.current_type(), TypeTag::of::<Person>());
    }

    #[test]
    fn append_advances_current_type() {
        let field = Field::new("age", age, false).unwrap();
        let mut p = fresh();
        p.append(IntermediateOperation::filter(field.greater_than(1)))
            .unwrap()
            .append(IntermediateOperation::map(|p: Person| p.name))
            .unwrap();
        assert_eq!(p.operations().len(), 2);
        assert_eq!(p.current_type(), TypeTag::of::<String>());
        assert_eq!(p.root(), TypeTag::of::<Person>());
    }

    #[test]
    fn mismatched_input_is_rejected() {
        let mut p = fresh();
        let err = p.append(IntermediateOperation::limit::<String>(3)).unwrap_err();
        match err {
            FieldflowError::TypeMismatch {
                position,
                expected,
                actual,
            } => {
                assert_eq!(position, 0);
                assert!(expected.contains("String"));
                assert!(actual.contains("Person"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(p.operations().is_empty());
    }

    #[test]
    fn terminal_seals() {
        let mut p = fresh();
        p.set_terminal(TerminalOperation::count::<Person>()).unwrap();
        assert!(p.is_sealed());

        let err = p.append(IntermediateOperation::skip::<Person>(1)).unwrap_err();
        assert!(matches!(
            err,
            FieldflowError::PipelineSealed { terminal: "count" }
        ));
        let err = p
            .set_terminal(TerminalOperation::collect::<Person>())
            .unwrap_err();
        assert!(matches!(err, FieldflowError::PipelineSealed { .. }));
        assert_eq!(
            p.terminal().map(TerminalOperation::kind),
            Some(TerminalOperationType::Count)
        );
    }

    #[test]
    fn terminal_input_is_checked() {
        let mut p = fresh();
        let err = p
            .set_terminal(TerminalOperation::collect::<u8>())
            .unwrap_err();
        assert!(matches!(err, FieldflowError::TypeMismatch { position: 0, .. }));
        assert!(!p.is_sealed());
    }

    #[test]
    fn display_lists_stages() {
        let mut p = fresh();
        p.append(IntermediateOperation::skip::<Person>(1))
            .unwrap()
            .set_terminal(TerminalOperation::count::<Person>())
            .unwrap();
        let text = p.to_string();
        assert!(text.ends_with("Person | skip | count"), "{text}");
    }

    #[test]
    fn element_helpers() {
        let elements = rebox(vec![1u8, 2, 3]);
        assert_eq!(*view::<u8>(&elements[0]).unwrap(), 1);
        assert!(view::<u16>(&elements[0]).is_err());
        assert_eq!(unbox_all::<u8>(elements).unwrap(), vec![1, 2, 3]);

        let err = unbox::<String>(Box::new(5i32)).unwrap_err();
        assert!(matches!(err, FieldflowError::ElementType { .. }));
    }
}
