//! Implementation of the `#[derive(Fields)]` macro.

mod attrs;
mod derive;

pub use derive::fields_derive_impl;
