//! The lazy stream.
//!
//! A [`QueryStream`] is a source plus a pipeline of pending stages. Every
//! transformation returns a new stream that shares the source; nothing is
//! pulled from the source until the stream is iterated.
//!
//! Three steps read ahead of the consumer, each only once the stream that
//! contains it is first advanced:
//!
//! - an ordering stage buffers everything upstream of it to sort;
//! - [`QueryStream::all`] buffers everything upstream of it into a snapshot;
//! - `Debug`/`Display` materialize the whole stream to render it.

use std::cell::RefCell;
use std::fmt;
use std::iter;
use std::ops::{BitOr, Bound, RangeBounds};
use std::rc::Rc;

use tracing::debug;

use crate::error::Result;
use crate::fields::Fields;
use crate::ordering::{sort_items, OrderBy};
use crate::q::Q;
use crate::source::{Cursor, Items, Snapshot, Source, StreamState};

enum Stage<T> {
    Filter(Q<T>),
    Order(Rc<[OrderBy]>),
    Slice { start: usize, stop: Option<usize> },
}

impl<T> Clone for Stage<T> {
    fn clone(&self) -> Self {
        match self {
            Stage::Filter(q) => Stage::Filter(q.clone()),
            Stage::Order(orderings) => Stage::Order(Rc::clone(orderings)),
            Stage::Slice { start, stop } => Stage::Slice {
                start: *start,
                stop: *stop,
            },
        }
    }
}

impl<T: Clone + Fields + 'static> Stage<T> {
    fn apply(&self, upstream: Items<T>) -> Items<T> {
        match self {
            Stage::Filter(q) => {
                let q = q.clone();
                Box::new(upstream.filter_map(move |item| {
                    let item = match item {
                        Ok(item) => item,
                        Err(err) => return Some(Err(err)),
                    };
                    match q.matches(&item) {
                        Ok(true) => Some(Ok(item)),
                        Ok(false) => None,
                        Err(err) => Some(Err(err)),
                    }
                }))
            }
            Stage::Order(orderings) => {
                let orderings = Rc::clone(orderings);
                let sorted = iter::once_with(move || -> Result<Vec<T>> {
                    let items = upstream.collect::<Result<Vec<T>>>()?;
                    debug!(
                        target: "querystream::stream",
                        items = items.len(),
                        keys = orderings.len(),
                        "sorting stream"
                    );
                    sort_items(items, &orderings)
                });
                Box::new(sorted.flat_map(|sorted| -> Items<T> {
                    match sorted {
                        Ok(items) => Box::new(items.into_iter().map(Ok)),
                        Err(err) => Box::new(iter::once(Err(err))),
                    }
                }))
            }
            Stage::Slice { start, stop } => {
                let skipped = upstream.skip(*start);
                match stop {
                    Some(stop) => Box::new(skipped.take(stop.saturating_sub(*start))),
                    None => Box::new(skipped),
                }
            }
        }
    }
}

/// A lazy, chainable view over a source of items.
///
/// # Example
///
/// ```
/// use querystream::{Q, QueryStream};
///
/// let letters: QueryStream<char> = "abcde".chars().collect();
/// let not_b = letters.filter(Q::func(|c: &char| *c != 'b'));
/// assert_eq!(not_b.slice(..3).to_vec().unwrap(), ['a', 'c', 'd']);
///
/// // Infinite sources work as long as the consumer bounds them.
/// let cycled = QueryStream::single_pass("abcd".chars().cycle());
/// assert_eq!(cycled.slice(..6).to_vec().unwrap(), ['a', 'b', 'c', 'd', 'a', 'b']);
/// ```
///
/// # Sharing
///
/// Streams built from a concrete source (`new`, `collect`) traverse it
/// independently. Streams built from [`QueryStream::single_pass`] share one
/// cursor: consuming one derived stream takes those items away from its
/// siblings. Call [`QueryStream::all`] to give descendants a private copy.
pub struct QueryStream<T> {
    source: Source<T>,
    stages: Vec<Stage<T>>,
}

impl<T> Clone for QueryStream<T> {
    fn clone(&self) -> Self {
        QueryStream {
            source: self.source.clone(),
            stages: self.stages.clone(),
        }
    }
}

impl<T> QueryStream<T> {
    /// A stream that never yields anything, whatever is chained onto it.
    pub fn none() -> Self {
        QueryStream {
            source: Source::Empty,
            stages: Vec::new(),
        }
    }

    /// Reports how far the stream's source has been consumed.
    ///
    /// Only single-pass sources ever leave [`StreamState::Unmaterialized`].
    pub fn state(&self) -> StreamState {
        self.source.state()
    }

    /// Returns the concrete sequence backing this stream, if it has one and
    /// no stages are pending.
    ///
    /// [`QueryStream::none`] always returns an empty slice. A snapshot
    /// from [`QueryStream::all`] returns its buffer once it has been filled.
    pub fn realized(&self) -> Option<&[T]> {
        if !self.stages.is_empty() {
            return None;
        }
        match &self.source {
            Source::Empty => {
                let empty: &[T] = &[];
                Some(empty)
            }
            Source::Concrete(items) => Some(&items[..]),
            Source::Snapshot(snapshot) => snapshot.filled(),
            Source::Shared(_) | Source::Chain(_) => None,
        }
    }
}

impl<T: Clone + Fields + 'static> QueryStream<T> {
    /// Wraps a concrete, re-iterable sequence.
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        QueryStream {
            source: Source::Concrete(items.into()),
            stages: Vec::new(),
        }
    }

    /// Wraps a single-pass iterator, shared by every stream derived from this one.
    pub fn single_pass<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        QueryStream {
            source: Source::Shared(Rc::new(RefCell::new(Cursor::new(Box::new(
                iter.into_iter(),
            ))))),
            stages: Vec::new(),
        }
    }

    fn with_stage(&self, stage: Stage<T>) -> Self {
        let mut derived = self.clone();
        derived.stages.push(stage);
        derived
    }

    /// Keeps the items for which `predicate` holds.
    pub fn filter(&self, predicate: Q<T>) -> Self {
        self.with_stage(Stage::Filter(predicate))
    }

    /// Keeps the items for which every predicate holds.
    ///
    /// No predicates means no filtering.
    pub fn filter_all(&self, predicates: impl IntoIterator<Item = Q<T>>) -> Self {
        match Q::all_of(predicates) {
            Some(combined) => self.filter(combined),
            None => self.clone(),
        }
    }

    /// Drops the items for which `predicate` holds.
    pub fn exclude(&self, predicate: Q<T>) -> Self {
        self.filter(!predicate)
    }

    /// Drops the items for which every predicate holds.
    ///
    /// No predicates means nothing is dropped.
    pub fn exclude_all(&self, predicates: impl IntoIterator<Item = Q<T>>) -> Self {
        match Q::all_of(predicates) {
            Some(combined) => self.exclude(combined),
            None => self.clone(),
        }
    }

    /// Sorts by field-path keys; a leading `-` makes a key descending.
    ///
    /// The sort is stable. Keys are validated here; they are resolved only
    /// when the stream is consumed, at which point everything upstream is
    /// buffered.
    ///
    /// ```
    /// use querystream::QueryStream;
    ///
    /// let numbers: QueryStream<i32> = QueryStream::new(vec![3, 1, 2]);
    /// assert!(numbers.order_by(["-"]).is_err());
    /// assert!(numbers.order_by(["name__"]).is_err());
    /// ```
    pub fn order_by<I, S>(&self, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let orderings = keys
            .into_iter()
            .map(|key| OrderBy::parse(key.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if orderings.is_empty() {
            return Ok(self.clone());
        }
        Ok(self.with_stage(Stage::Order(orderings.into())))
    }

    /// Returns a stream whose descendants each see the full remaining sequence.
    ///
    /// The first time any descendant is advanced, this stream's output is
    /// drained once into a private buffer; every descendant then reads that
    /// buffer instead of competing for a shared cursor.
    pub fn all(&self) -> Self {
        QueryStream {
            source: Source::Snapshot(Rc::new(Snapshot::new(self.clone()))),
            stages: Vec::new(),
        }
    }

    /// Restricts the stream to a sub-range of positions.
    ///
    /// With an end bound the source is never read past it, so this is how an
    /// infinite source is consumed safely.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&end) => Some(end.saturating_add(1)),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => None,
        };
        self.with_stage(Stage::Slice { start, stop })
    }

    /// Yields all of `self`, then all of `other`.
    ///
    /// Bare concatenations are flattened, so long `a | b | c | ...` chains
    /// stay one level deep.
    pub fn concat(&self, other: &QueryStream<T>) -> Self {
        let mut parts = Vec::new();
        self.push_chain_parts(&mut parts);
        other.push_chain_parts(&mut parts);
        QueryStream {
            source: Source::Chain(parts.into()),
            stages: Vec::new(),
        }
    }

    fn push_chain_parts(&self, parts: &mut Vec<QueryStream<T>>) {
        match &self.source {
            Source::Chain(inner) if self.stages.is_empty() => parts.extend(inner.iter().cloned()),
            _ => parts.push(self.clone()),
        }
    }

    pub(crate) fn items(&self) -> Items<T> {
        self.stages
            .iter()
            .fold(self.source.open(), |upstream, stage| stage.apply(upstream))
    }

    /// Starts a lazy traversal.
    ///
    /// Each item is a `Result` because a field path may fail to resolve on it.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            inner: self.items(),
        }
    }

    /// Materializes the stream, stopping at the first error.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    /// Returns the first item, or `None` if the stream is empty.
    pub fn first(&self) -> Result<Option<T>> {
        self.iter().next().transpose()
    }

    /// Counts the items, consuming the stream.
    pub fn count(&self) -> Result<usize> {
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    /// Returns `true` if the stream yields at least one item.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.first()?.is_some())
    }
}

/// Lazy traversal of a [`QueryStream`].
pub struct Iter<T> {
    inner: Items<T>,
}

impl<T> Iterator for Iter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<T: Clone + Fields + 'static> IntoIterator for &QueryStream<T> {
    type Item = Result<T>;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

impl<T: Clone + Fields + 'static> IntoIterator for QueryStream<T> {
    type Item = Result<T>;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

impl<T: Clone + Fields + 'static> FromIterator<T> for QueryStream<T> {
    /// Collects into a concrete, re-iterable source.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        QueryStream::new(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T: Clone + Fields + 'static> From<Vec<T>> for QueryStream<T> {
    fn from(items: Vec<T>) -> Self {
        QueryStream::new(items)
    }
}

impl<T: Clone + Fields + 'static> BitOr for QueryStream<T> {
    type Output = QueryStream<T>;

    fn bitor(self, rhs: QueryStream<T>) -> QueryStream<T> {
        self.concat(&rhs)
    }
}

impl<T: Clone + Fields + 'static> BitOr for &QueryStream<T> {
    type Output = QueryStream<T>;

    fn bitor(self, rhs: &QueryStream<T>) -> QueryStream<T> {
        self.concat(rhs)
    }
}

impl<T: Clone + Fields + fmt::Debug + 'static> fmt::Display for QueryStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_vec() {
            Ok(items) => write!(f, "QueryStream({items:?})"),
            Err(err) => write!(f, "QueryStream(<error: {err}>)"),
        }
    }
}

impl<T: Clone + Fields + fmt::Debug + 'static> fmt::Debug for QueryStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    fn letters(s: &str) -> QueryStream<char> {
        s.chars().collect()
    }

    fn collect(stream: &QueryStream<char>) -> String {
        stream.iter().map(|c| c.unwrap()).collect()
    }

    #[test]
    fn iterates_in_order() {
        let stream = letters("ab");
        let mut out = Vec::new();
        for c in &stream {
            out.push(c.unwrap());
        }
        assert_eq!(out, ['a', 'b']);
    }

    #[test]
    fn slices() {
        let stream = letters("abcd");
        assert_eq!(collect(&stream.slice(..2)), "ab");
        assert_eq!(collect(&stream.slice(2..)), "cd");
        assert_eq!(collect(&stream.slice(1..3)), "bc");
        assert_eq!(collect(&stream.slice(1..=2)), "bc");
        assert_eq!(collect(&stream.slice(3..1)), "");
        assert_eq!(collect(&stream.slice(10..)), "");
    }

    #[test]
    fn slice_of_infinite_source_terminates() {
        let stream = QueryStream::single_pass("abcd".chars().cycle()).slice(..6);
        assert_eq!(collect(&stream), "abcdab");
    }

    #[test]
    fn pipe_chain() {
        let chained = letters("ab") | letters("c") | letters("d");
        assert_eq!(collect(&chained), "abcd");
    }

    #[test]
    fn concat_reads_right_side_lazily() {
        let shared = QueryStream::single_pass("xyz".chars());
        let chained = letters("ab").concat(&shared);
        let mut iter = chained.iter();
        assert_eq!(iter.next().unwrap().unwrap(), 'a');
        assert_eq!(iter.next().unwrap().unwrap(), 'b');
        assert_eq!(shared.state(), StreamState::Unmaterialized);
        assert_eq!(iter.next().unwrap().unwrap(), 'x');
        assert_eq!(shared.state(), StreamState::Materializing);
    }

    #[test]
    fn long_concat_chains_stay_flat() {
        let chained = (0..5_000).fold(QueryStream::<i32>::none(), |acc, n| {
            acc | QueryStream::new(vec![n])
        });
        match &chained.source {
            Source::Chain(parts) => assert_eq!(parts.len(), 5_001),
            _ => panic!("expected a chain source"),
        }
        assert_eq!(chained.count().unwrap(), 5_000);
        assert_eq!(chained.slice(4_998..).to_vec().unwrap(), [4_998, 4_999]);
    }

    #[test]
    fn concat_keeps_staged_parts_intact() {
        let without_c = (letters("ab") | letters("cd")).filter(Q::func(|c: &char| *c != 'c'));
        let chained = &without_c | &letters("e");
        assert_eq!(collect(&chained), "abde");
        match &chained.source {
            Source::Chain(parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected a chain source"),
        }
    }

    #[test]
    fn filter_does_not_pull_until_iterated() {
        let shared = QueryStream::single_pass("abc".chars());
        let filtered = shared.filter(Q::func(|c: &char| *c != 'a'));
        assert_eq!(shared.state(), StreamState::Unmaterialized);
        assert_eq!(filtered.first().unwrap(), Some('b'));
        assert_eq!(shared.state(), StreamState::Materializing);
        assert_eq!(collect(&filtered), "c");
        assert_eq!(filtered.state(), StreamState::Exhausted);
    }

    #[test]
    fn ordering_is_deferred_until_consumed() {
        let shared: QueryStream<i32> = QueryStream::single_pass(vec![3, 1, 2]);
        let ordered = shared.order_by(["missing"]).unwrap();
        assert_eq!(ordered.state(), StreamState::Unmaterialized);
        assert!(matches!(
            ordered.first(),
            Err(QueryError::AttributeResolution { .. })
        ));
        assert_eq!(shared.state(), StreamState::Exhausted);
    }

    #[test]
    fn empty_ordering_is_identity() {
        let stream: QueryStream<i32> = QueryStream::new(vec![3, 1, 2]);
        let ordered = stream.order_by(Vec::<&str>::new()).unwrap();
        assert_eq!(ordered.to_vec().unwrap(), [3, 1, 2]);
        assert_eq!(ordered.realized(), Some(&[3, 1, 2][..]));
    }

    #[test]
    fn filter_all_and_exclude_all_without_predicates_are_identity() {
        let stream = letters("abc");
        assert_eq!(collect(&stream.filter_all(Vec::new())), "abc");
        assert_eq!(collect(&stream.exclude_all(Vec::new())), "abc");
    }

    #[test]
    fn exclude_complements_filter() {
        let stream = letters("abcde");
        let vowel = Q::func(|c: &char| "aeiou".contains(*c));
        assert_eq!(collect(&stream.filter(vowel.clone())), "ae");
        assert_eq!(collect(&stream.exclude(vowel)), "bcd");
    }

    #[test]
    fn none_is_empty_and_stable() {
        let none = QueryStream::<char>::none();
        assert_eq!(none.realized(), Some(&[][..]));
        assert_eq!(none.first().unwrap(), None);
        assert_eq!(none.slice(..5).count().unwrap(), 0);
        assert_eq!(none.filter(Q::func(|_: &char| true)).count().unwrap(), 0);
    }

    #[test]
    fn realized_exposes_concrete_buffer_only() {
        let stream = letters("ab");
        assert_eq!(stream.realized(), Some(&['a', 'b'][..]));
        assert_eq!(stream.slice(..1).realized(), None);
        assert_eq!(QueryStream::single_pass("ab".chars()).realized(), None);
    }

    #[test]
    fn all_snapshot_is_shared_by_descendants() {
        let snapshot = QueryStream::single_pass("abcde".chars()).all();
        assert_eq!(snapshot.realized(), None);
        let first = snapshot.filter(Q::func(|c: &char| *c != 'b'));
        let second = snapshot.filter(Q::func(|c: &char| *c != 'a'));
        assert_eq!(collect(&first), "acde");
        assert_eq!(collect(&second), "bcde");
        assert_eq!(snapshot.realized(), Some(&['a', 'b', 'c', 'd', 'e'][..]));
    }

    #[test]
    fn first_count_exists() {
        let stream: QueryStream<i32> = QueryStream::new(vec![1, 2, 3]);
        assert_eq!(stream.first().unwrap(), Some(1));
        assert_eq!(stream.count().unwrap(), 3);
        assert!(stream.exists().unwrap());
        assert!(!stream.filter(Q::func(|n: &i32| *n > 3)).exists().unwrap());
    }

    #[test]
    fn repr_materializes() {
        let stream: QueryStream<i32> = QueryStream::new(vec![1, 2, 3]);
        assert_eq!(format!("{stream:?}"), "QueryStream([1, 2, 3])");
        assert_eq!(stream.to_string(), "QueryStream([1, 2, 3])");
        let big = stream.filter(Q::func(|n: &i32| *n > 2)).all();
        assert_eq!(format!("{big:?}"), "QueryStream([3])");
    }

    #[test]
    fn resolution_errors_surface_per_item() {
        let stream = letters("ab").filter(Q::field("missing", 1).unwrap());
        let results: Vec<_> = stream.iter().collect();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| matches!(
            r,
            Err(QueryError::AttributeResolution { .. })
        )));
        assert!(stream.to_vec().is_err());
        assert_eq!(
            stream.to_string(),
            "QueryStream(<error: cannot resolve 'missing' in field path 'missing'>)"
        );
    }

    #[test]
    fn failed_snapshot_reports_to_every_descendant() {
        let snapshot = letters("ab").filter(Q::field("missing", 1).unwrap()).all();
        assert!(snapshot.to_vec().is_err());
        assert!(snapshot.slice(..1).first().is_err());
    }
}
