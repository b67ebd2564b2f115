//! Ordering keys for [`QueryStream::order_by`].
//!
//! [`QueryStream::order_by`]: crate::QueryStream::order_by

use std::cmp::Ordering;
use std::fmt;

use crate::error::Result;
use crate::fields::Fields;
use crate::path::FieldPath;
use crate::value::Scalar;

/// Marks a key as descending when it prefixes the field path.
pub const DESCENDING_PREFIX: char = '-';

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ordering key: a field path and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to sort by.
    pub path: FieldPath,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderBy {
    /// Parses a key such as `"name"` (ascending) or `"-name"` (descending).
    ///
    /// ```
    /// use querystream::{Dir, OrderBy};
    ///
    /// let key = OrderBy::parse("-related__rank").unwrap();
    /// assert_eq!(key.dir, Dir::Desc);
    /// assert_eq!(key.path.as_str(), "related__rank");
    /// ```
    pub fn parse(key: &str) -> Result<Self> {
        match key.strip_prefix(DESCENDING_PREFIX) {
            Some(path) => Ok(OrderBy::new(FieldPath::parse(path)?, Dir::Desc)),
            None => Ok(OrderBy::new(FieldPath::parse(key)?, Dir::Asc)),
        }
    }

    /// Creates an ordering with the given direction.
    pub fn new(path: FieldPath, dir: Dir) -> Self {
        OrderBy { path, dir }
    }

    /// Resolves this key on an item into an owned sort value.
    ///
    /// Related objects have no scalar form and yield `None`.
    pub fn key_of(&self, item: &dyn Fields) -> Result<Option<Scalar>> {
        Ok(self.path.resolve(item)?.to_scalar())
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dir {
            Dir::Asc => write!(f, "{}", self.path),
            Dir::Desc => write!(f, "{DESCENDING_PREFIX}{}", self.path),
        }
    }
}

/// Compares two resolved key tuples using the orderings they were built from.
///
/// The first key is primary, later keys break ties. Every key pair is
/// totally ordered (see [`Scalar::sort_cmp`]): NaN sorts after other
/// numbers, mixed types sort by a fixed type rank, and related objects
/// (`None`) sort after everything, including `Null`.
pub fn compare_keys(a: &[Option<Scalar>], b: &[Option<Scalar>], orderings: &[OrderBy]) -> Ordering {
    for ((key_a, key_b), order_by) in a.iter().zip(b).zip(orderings) {
        let ordering = match (key_a, key_b) {
            (Some(x), Some(y)) => x.sort_cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return order_by.dir.apply(ordering);
        }
    }
    Ordering::Equal
}

/// Stable-sorts items by the given orderings.
///
/// Every key is resolved once per item before sorting; the first resolution
/// failure aborts the sort.
pub fn sort_items<T: Fields>(items: Vec<T>, orderings: &[OrderBy]) -> Result<Vec<T>> {
    let mut keyed = items
        .into_iter()
        .map(|item| {
            let keys = orderings
                .iter()
                .map(|order_by| order_by.key_of(&item))
                .collect::<Result<Vec<_>>>()?;
            Ok((keys, item))
        })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, orderings));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}
