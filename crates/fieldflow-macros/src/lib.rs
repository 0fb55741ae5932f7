//! Proc macros for fieldflow.
//!
//! # Available Macros
//!
//! - [`Entity`] - Generate typed `Field` constants and the `Entity` impl from
//!   struct field annotations
//!
//! For working examples, see `fieldflow/tests/derive.rs`.

mod entity;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Entity` trait and one `Field` constant per column.
///
/// Only fields annotated with `#[field]` become columns.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[field]` | Make this field a column |
/// | `#[field(unique)]` | The column is a candidate key |
/// | `#[field(rename = "...")]` | Use a custom column name |
/// | `#[field(skip)]` | Exclude this field |
///
/// A field of type `Option<T>` becomes a nullable column of `T`.
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. One constant per column, named after the field in SCREAMING_SNAKE_CASE
///    (e.g., `Person::AGE: Field<Person, i32>`)
/// 2. An implementation of `Entity` whose `COLUMNS` lists every column
///
/// # Example
///
/// ```ignore
/// use fieldflow::{Entity, Inclusion};
///
/// #[derive(Entity)]
/// struct Person {
///     #[field(unique)]
///     id: u64,
///
///     #[field]
///     name: Option<String>,
///
///     #[field(rename = "years")]
///     age: i32,
///
///     #[field(skip)]
///     cache: Vec<u8>,
/// }
///
/// let adults = Person::AGE.between(18, 65, Inclusion::StartInclusiveEndInclusive);
/// let by_name = Person::NAME.comparator_null_fields_first();
/// assert_eq!(Person::COLUMNS.len(), 3);
/// ```
///
/// # Compile-Time Errors
///
/// - Enums, unions and tuple structs
/// - Generic structs
/// - Empty `rename`, or two columns with the same name
/// - Unknown attribute keys
#[proc_macro_derive(Entity, attributes(field))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::entity_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
