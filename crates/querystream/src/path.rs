//! Field paths: chains of attribute names separated by `__`.

use std::fmt;

use crate::error::{QueryError, Result};
use crate::fields::Fields;
use crate::value::Value;

/// Separator between the segments of a field path.
pub const PATH_DELIMITER: &str = "__";

/// A validated chain of attribute names.
///
/// `related_model__other_number` reads `related_model` on the item, then
/// `other_number` on the related object it returns.
///
/// ```
/// use querystream::FieldPath;
///
/// let path = FieldPath::parse("related_model__other_number").unwrap();
/// assert_eq!(path.segments().collect::<Vec<_>>(), ["related_model", "other_number"]);
/// assert!(FieldPath::parse("related_model____x").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits and validates a delimited path.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(QueryError::InvalidFieldPath {
                path: path.to_string(),
                reason: "path is empty",
            });
        }
        let segments: Vec<String> = path.split(PATH_DELIMITER).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(QueryError::InvalidFieldPath {
                path: path.to_string(),
                reason: "path contains an empty segment",
            });
        }
        Ok(FieldPath {
            raw: path.to_string(),
            segments,
        })
    }

    /// Returns the path as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Iterates over the attribute names in traversal order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: a parsed path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves this path against an item.
    ///
    /// Every segment but the last must yield [`Value::Related`]. A missing
    /// attribute, or an attempt to descend into anything that is not a
    /// related object, is an [`QueryError::AttributeResolution`].
    pub fn resolve<'a>(&self, item: &'a dyn Fields) -> Result<Value<'a>> {
        let mut current = item;
        let mut segments = self.segments.iter().peekable();
        while let Some(segment) = segments.next() {
            let value = current
                .field_value(segment)
                .ok_or_else(|| self.unresolved(segment))?;
            let Some(next_segment) = segments.peek() else {
                return Ok(value);
            };
            current = match value {
                Value::Related(next) => next,
                _ => return Err(self.unresolved(next_segment)),
            };
        }
        Err(QueryError::InvalidFieldPath {
            path: self.raw.clone(),
            reason: "path is empty",
        })
    }

    fn unresolved(&self, segment: &str) -> QueryError {
        QueryError::AttributeResolution {
            path: self.raw.clone(),
            segment: segment.to_string(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
