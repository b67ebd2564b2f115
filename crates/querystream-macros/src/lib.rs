//! Proc macros for querystream.
//!
//! # Available Macros
//!
//! - [`Fields`] - Generate a `querystream::Fields` implementation and field
//!   name constants from struct field annotations
//!
//! The derive is re-exported by `querystream` under its default `derive`
//! feature, so most users never depend on this crate directly.

mod fields;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `querystream::Fields` for a struct with named fields.
///
/// Only fields annotated with `#[field(...)]` are readable by name; the
/// rest resolve as missing attributes.
///
/// # Field Attributes
///
/// | Attribute | Value produced |
/// |-----------|----------------|
/// | `#[field(String)]` | `Value::String`, borrowed from a `String` or `&str` |
/// | `#[field(Number)]` | `Value::Number`, from any `Copy` numeric type |
/// | `#[field(Timestamp)]` | `Value::Timestamp`, via `AsTimestamp` |
/// | `#[field(Bool)]` | `Value::Bool` |
/// | `#[field(Related)]` | `Value::Related`, for a nested `Fields` type |
/// | `#[field(skip)]` | not exposed |
/// | `#[field(String, rename = "title")]` | exposed under another name |
///
/// # Generated Constants
///
/// One `SCREAMING_SNAKE_CASE` constant per exposed field holds its query
/// name, for building paths without string typos.
///
/// # Example
///
/// ```ignore
/// use querystream::{Fields, QueryStream, q};
///
/// #[derive(Clone, Fields)]
/// struct Owner {
///     #[field(String)]
///     name: String,
/// }
///
/// #[derive(Clone, Fields)]
/// struct Pet {
///     #[field(String)]
///     name: String,
///     #[field(Number)]
///     age: u8,
///     #[field(Related)]
///     owner: Owner,
/// }
///
/// assert_eq!(Pet::AGE, "age");
/// let pets = QueryStream::new(vec![/* ... */]);
/// let alices = pets.filter(q! { owner__name = "Alice" }?);
/// ```
#[proc_macro_derive(Fields, attributes(field))]
pub fn fields_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    fields::fields_derive_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
