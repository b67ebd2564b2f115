//! Error types for the querystream crate.

use thiserror::Error;

/// Errors that can occur when building predicates or materializing streams.
///
/// The error is `Clone` so that a failed snapshot (see [`QueryStream::all`])
/// can report the same failure to every stream derived from it.
///
/// [`QueryStream::all`]: crate::QueryStream::all
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A predicate leaf was given both a field mapping and a callable, or neither.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A field path is empty or contains an empty segment.
    #[error("invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: &'static str },

    /// A segment of a field path does not exist on the traversed object.
    #[error("cannot resolve '{segment}' in field path '{path}'")]
    AttributeResolution { path: String, segment: String },

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Result type for querystream operations.
pub type Result<T> = std::result::Result<T, QueryError>;
