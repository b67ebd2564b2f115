//! QueryStream - lazy, chainable queries over in-memory item streams.
//!
//! QueryStream wraps any sequence of items (a `Vec`, a slice, a generator,
//! an infinite iterator) and lets you filter, exclude, order, slice and
//! concatenate it without evaluating anything until you iterate. It supports:
//!
//! - Attribute matching through field paths, including relations
//!   (`related_model__other_number`)
//! - Closure predicates, freely mixed with attribute matches
//! - Predicate algebra with `&`, `|` and `!`
//! - Re-iterable and single-pass sources, with explicit sharing rules
//!
//! # Quick Start
//!
//! ```rust
//! use querystream::{Fields, Number, Q, QueryStream, Value, q};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Task {
//!     name: &'static str,
//!     priority: i64,
//! }
//!
//! impl Fields for Task {
//!     fn field_value(&self, name: &str) -> Option<Value<'_>> {
//!         match name {
//!             "name" => Some(Value::String(self.name)),
//!             "priority" => Some(Value::Number(Number::I64(self.priority))),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let tasks = QueryStream::new(vec![
//!     Task { name: "Write docs", priority: 3 },
//!     Task { name: "Fix bug", priority: 5 },
//!     Task { name: "Old task", priority: 1 },
//! ]);
//!
//! let urgent = q! { priority = 5 }.unwrap() | Q::func(|t: &Task| t.name.starts_with("Write"));
//! let picked = tasks.filter(urgent).order_by(["-priority"]).unwrap();
//!
//! let names: Vec<_> = picked.to_vec().unwrap().iter().map(|t| t.name).collect();
//! assert_eq!(names, ["Fix bug", "Write docs"]);
//! ```
//!
//! # Sources
//!
//! | Constructor | Source | Derived streams |
//! |-------------|--------|-----------------|
//! | `QueryStream::new`, `collect()` | concrete | each traverses independently |
//! | `QueryStream::single_pass` | one iterator | share a single cursor |
//! | `QueryStream::none` | empty | always empty |
//! | `stream.all()` | private snapshot | each sees the full snapshot |
//!
//! # Lookups
//!
//! | Lookup | Applies to |
//! |--------|------------|
//! | `Exact` | any value, no type coercion |
//! | `IExact`, `Contains`, `IContains`, `StartsWith`, `EndsWith`, `Regex` | strings |
//! | `Gt`, `Gte`, `Lt`, `Lte` | numbers, timestamps, strings, booleans |
//! | `In` | any value, against a set |
//! | `IsNull` | any value |
//!
//! # Errors
//!
//! Malformed predicates and field paths are rejected when they are built.
//! A path that does not resolve on a particular item is reported when that
//! item is reached, as an `Err` from the stream's iterator.
//!
//! # Logging
//!
//! Materialization points (sorts, snapshots, source exhaustion) emit
//! `tracing` events under the `querystream::stream` target.

mod error;
mod fields;
mod lookup;
mod ordering;
mod path;
mod q;
mod source;
mod stream;
mod value;

// Re-export public API
pub use error::{QueryError, Result};
pub use fields::{AsTimestamp, Fields};
pub use lookup::{Condition, Lookup, Operand};
pub use ordering::{compare_keys, sort_items, Dir, OrderBy, DESCENDING_PREFIX};
pub use path::{FieldPath, PATH_DELIMITER};
pub use q::{Predicate, Q};
pub use source::StreamState;
pub use stream::{Iter, QueryStream};
pub use value::{Number, Scalar, Timestamp, Value};

#[cfg(feature = "derive")]
pub use querystream_macros::Fields;
