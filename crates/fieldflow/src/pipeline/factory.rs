//! Pipeline creation and execution hints.

use super::{Pipeline, StreamBuilder};

/// Execution hints copied into every pipeline a factory creates.
///
/// Executors may honour or ignore them. The in-memory executor always runs
/// sequentially and in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineOptions {
    /// Encounter order must be preserved.
    pub ordered: bool,
    /// Stages may run in parallel.
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            ordered: true,
            parallel: false,
        }
    }
}

impl PipelineOptions {
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Creates empty pipelines for a root record type.
pub trait PipelineFactory {
    /// Hints given to every created pipeline.
    fn options(&self) -> PipelineOptions;

    /// Returns a new, empty pipeline over `R`.
    fn create_pipeline<R: 'static>(&self) -> Pipeline<R> {
        Pipeline::new(self.options())
    }

    /// Returns a typed builder over a new, empty pipeline.
    fn create_stream<R: Send + 'static>(&self) -> StreamBuilder<R, R> {
        StreamBuilder::new(self.create_pipeline())
    }
}

/// The default [`PipelineFactory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardPipelineFactory {
    options: PipelineOptions,
}

impl StandardPipelineFactory {
    /// A factory creating ordered, sequential pipelines.
    pub fn new() -> Self {
        StandardPipelineFactory::default()
    }

    pub fn with_options(options: PipelineOptions) -> Self {
        StandardPipelineFactory { options }
    }
}

impl PipelineFactory for StandardPipelineFactory {
    fn options(&self) -> PipelineOptions {
        self.options
    }
}
