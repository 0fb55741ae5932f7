//! Fieldflow - Typed predicates, comparators and reified stream pipelines.
//!
//! Fieldflow lets you describe queries over Rust records as plain data that can
//! be evaluated in memory, inspected, or translated into another backend's
//! query form. It provides:
//!
//! - Typed field handles, with the operators a value type supports
//! - Negatable predicates whose negation is the exact logical complement,
//!   including on null values
//! - Comparators with independent direction and null placement
//! - Pipelines: type-chained intermediate stages capped by one terminal stage
//! - An executor boundary, with an in-memory reference executor
//!
//! # Quick Start
//!
//! ```rust
//! use fieldflow::{
//!     Entity, Executor, InMemoryExecutor, Inclusion, PipelineFactory,
//!     StandardPipelineFactory,
//! };
//!
//! #[derive(Debug, Entity)]
//! struct Person {
//!     #[field(unique)]
//!     id: u32,
//!     #[field]
//!     name: Option<String>,
//!     #[field]
//!     age: i32,
//! }
//!
//! let people = vec![
//!     Person { id: 1, name: Some("Bo".into()), age: 41 },
//!     Person { id: 2, name: None, age: 30 },
//!     Person { id: 3, name: Some("Ann".into()), age: 17 },
//!     Person { id: 4, name: Some("Cy".into()), age: 65 },
//! ];
//!
//! let adults = Person::AGE.between(18, 65, Inclusion::StartInclusiveEndInclusive);
//!
//! let pipeline = StandardPipelineFactory::new()
//!     .create_stream::<Person>()
//!     .filter(adults)
//!     .sorted(Person::NAME.comparator())
//!     .map(|p: Person| p.id)
//!     .collect();
//!
//! let ids: Vec<u32> = InMemoryExecutor.execute(&pipeline, people)?.into_vec()?;
//! assert_eq!(ids, [1, 4, 2]);
//! # Ok::<(), fieldflow::FieldflowError>(())
//! ```
//!
//! # Predicate Semantics
//!
//! Every predicate kind has a complement, and `p.negate()` evaluates to
//! `!p.test(r)` for every record `r`. Null field values follow fixed rules:
//!
//! | Predicate | Null field value |
//! |-----------|------------------|
//! | `equal(v)`, `is_not_null` | false |
//! | `greater_than`, `less_than` | false |
//! | `greater_or_equal`, `less_or_equal` | true (complements of the strict forms) |
//! | `between` | per bound: true only on an inclusive side whose bound is null |
//! | `is_in` | true only if the set was built with null |
//! | string operators | false, except `is_empty` which is true |
//!
//! Comparators place nulls by [`NullOrder`]; [`FieldComparator::reversed`]
//! flips the order of non-null values and leaves nulls in place.
//!
//! # Logging
//!
//! Fieldflow emits [`tracing`] events and never installs a subscriber: `trace`
//! per appended stage, `debug` when pipelines are created, sealed or executed,
//! and `warn` when a precondition is rejected.
//!
//! # Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`PipelineOptions`] and the tag
//!   enums.

mod comparator;
mod entity;
mod error;
mod executor;
mod field;
mod pipeline;
mod predicate;
mod value;

// Re-export public API
pub use comparator::{CombinedComparator, Comparator, FieldComparator, NullOrder};
pub use entity::{Column, Entity};
pub use error::{FieldflowError, Result};
pub use executor::{Executor, InMemoryExecutor, Outcome};
pub use field::{Field, Getter, NullableGetter, ValueGetter};
pub use pipeline::{
    Argument, Element, Elements, FunctionalType, IntermediateOperation,
    IntermediateOperationType, Pipeline, PipelineFactory, PipelineOptions,
    StandardPipelineFactory, StreamBuilder, TerminalFunction, TerminalOperation,
    TerminalOperationType,
};
pub use predicate::{
    CombinedPredicate, Combiner, FieldPredicate, Inclusion, Operand, Predicate, PredicateType,
    ValueSet,
};
pub use value::{FieldValue, OrderedValue, TypeTag, ValueKind};

pub use fieldflow_macros::Entity;
