//! Sources backing a [`QueryStream`].
//!
//! A concrete source hands every traversal its own pass over a shared
//! buffer. A single-pass source wraps one iterator behind a shared cursor, so
//! every stream derived from it competes for the same items: whichever pulls
//! first wins.

use std::cell::{OnceCell, RefCell};
use std::iter;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::fields::Fields;
use crate::stream::QueryStream;

/// Boxed item sequence produced by a source or a pipeline stage.
pub(crate) type Items<T> = Box<dyn Iterator<Item = Result<T>>>;

/// Consumption state of a stream's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    /// Nothing has been pulled yet, or the source is re-iterable.
    #[default]
    Unmaterialized,
    /// A single-pass source has handed out items and may have more.
    Materializing,
    /// A single-pass source has run dry; further iteration yields nothing.
    Exhausted,
}

/// Shared cursor over a single-pass iterator.
pub(crate) struct Cursor<T> {
    iter: Box<dyn Iterator<Item = T>>,
    state: StreamState,
}

impl<T> Cursor<T> {
    pub(crate) fn new(iter: Box<dyn Iterator<Item = T>>) -> Self {
        Cursor {
            iter,
            state: StreamState::Unmaterialized,
        }
    }

    fn pull(&mut self) -> Option<T> {
        if self.state == StreamState::Exhausted {
            return None;
        }
        match self.iter.next() {
            Some(item) => {
                self.state = StreamState::Materializing;
                Some(item)
            }
            None => {
                trace!(target: "querystream::stream", "single-pass source exhausted");
                self.state = StreamState::Exhausted;
                None
            }
        }
    }
}

/// Private buffer filled from an upstream stream the first time it is read.
pub(crate) struct Snapshot<T> {
    upstream: QueryStream<T>,
    buffer: OnceCell<Result<Rc<[T]>>>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(upstream: QueryStream<T>) -> Self {
        Snapshot {
            upstream,
            buffer: OnceCell::new(),
        }
    }

    /// Returns the buffer if it has already been filled successfully.
    pub(crate) fn filled(&self) -> Option<&[T]> {
        match self.buffer.get() {
            Some(Ok(items)) => Some(&items[..]),
            _ => None,
        }
    }
}

impl<T: Clone + Fields + 'static> Snapshot<T> {
    fn force(&self) -> Result<Rc<[T]>> {
        self.buffer
            .get_or_init(|| {
                let items = self.upstream.to_vec()?;
                debug!(
                    target: "querystream::stream",
                    items = items.len(),
                    "snapshotted stream into private buffer"
                );
                Ok(Rc::from(items))
            })
            .clone()
    }
}

pub(crate) enum Source<T> {
    Empty,
    Concrete(Rc<[T]>),
    Shared(Rc<RefCell<Cursor<T>>>),
    Snapshot(Rc<Snapshot<T>>),
    /// Streams read back to back; never nests another bare chain.
    Chain(Rc<[QueryStream<T>]>),
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Source::Empty => Source::Empty,
            Source::Concrete(items) => Source::Concrete(Rc::clone(items)),
            Source::Shared(cursor) => Source::Shared(Rc::clone(cursor)),
            Source::Snapshot(snapshot) => Source::Snapshot(Rc::clone(snapshot)),
            Source::Chain(parts) => Source::Chain(Rc::clone(parts)),
        }
    }
}

impl<T> Source<T> {
    pub(crate) fn state(&self) -> StreamState {
        match self {
            Source::Empty | Source::Concrete(_) => StreamState::Unmaterialized,
            Source::Shared(cursor) => cursor.borrow().state,
            Source::Snapshot(snapshot) => match snapshot.buffer.get() {
                Some(_) => StreamState::Unmaterialized,
                None => snapshot.upstream.state(),
            },
            Source::Chain(parts) => {
                let states: Vec<StreamState> = parts.iter().map(QueryStream::state).collect();
                if states.iter().all(|s| *s == StreamState::Exhausted) {
                    StreamState::Exhausted
                } else if states.iter().all(|s| *s == StreamState::Unmaterialized) {
                    StreamState::Unmaterialized
                } else {
                    StreamState::Materializing
                }
            }
        }
    }
}

impl<T: Clone + Fields + 'static> Source<T> {
    /// Starts a traversal. Nothing is pulled until the result is advanced.
    pub(crate) fn open(&self) -> Items<T> {
        match self {
            Source::Empty => Box::new(iter::empty()),
            Source::Concrete(items) => concrete(Rc::clone(items)),
            Source::Shared(cursor) => {
                let cursor = Rc::clone(cursor);
                Box::new(iter::from_fn(move || cursor.borrow_mut().pull()).map(Ok))
            }
            Source::Snapshot(snapshot) => {
                let snapshot = Rc::clone(snapshot);
                Box::new(
                    iter::once_with(move || snapshot.force()).flat_map(|forced| -> Items<T> {
                        match forced {
                            Ok(items) => concrete(items),
                            Err(err) => Box::new(iter::once(Err(err))),
                        }
                    }),
                )
            }
            Source::Chain(parts) => {
                let parts = Rc::clone(parts);
                Box::new((0..parts.len()).flat_map(move |i| parts[i].items()))
            }
        }
    }
}

fn concrete<T: Clone + 'static>(items: Rc<[T]>) -> Items<T> {
    Box::new((0..items.len()).map(move |i| Ok(items[i].clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_state() {
        let mut cursor: Cursor<i32> = Cursor::new(Box::new(vec![1, 2].into_iter()));
        assert_eq!(cursor.state, StreamState::Unmaterialized);
        assert_eq!(cursor.pull(), Some(1));
        assert_eq!(cursor.state, StreamState::Materializing);
        assert_eq!(cursor.pull(), Some(2));
        assert_eq!(cursor.pull(), None);
        assert_eq!(cursor.state, StreamState::Exhausted);
        assert_eq!(cursor.pull(), None);
    }

    #[test]
    fn cursor_does_not_restart_a_fused_iterator() {
        let mut calls = 0;
        let flaky = iter::from_fn(move || {
            calls += 1;
            (calls != 1).then_some(calls)
        });
        let mut cursor: Cursor<i32> = Cursor::new(Box::new(flaky));
        assert_eq!(cursor.pull(), None);
        assert_eq!(cursor.pull(), None);
    }

    #[test]
    fn concrete_sources_reopen() {
        let source: Source<i32> = Source::Concrete(Rc::from(vec![1, 2, 3]));
        let first: Vec<i32> = source.open().map(|r| r.unwrap()).collect();
        let second: Vec<i32> = source.open().map(|r| r.unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(source.state(), StreamState::Unmaterialized);
    }

    #[test]
    fn shared_sources_drain_once() {
        let source: Source<i32> = Source::Shared(Rc::new(RefCell::new(Cursor::new(Box::new(
            vec![1, 2, 3].into_iter(),
        )))));
        let mut a = source.open();
        let mut b = source.clone().open();
        assert_eq!(a.next().unwrap().unwrap(), 1);
        assert_eq!(source.state(), StreamState::Materializing);
        assert_eq!(b.next().unwrap().unwrap(), 2);
        assert_eq!(a.next().unwrap().unwrap(), 3);
        assert!(b.next().is_none());
        assert_eq!(source.state(), StreamState::Exhausted);
    }
}
