//! Lazily produced sequences that can be consumed by any number of
//! independent cursors.
//!
//! A [`Stream`] wraps a pull source whose elements are computed at most once.
//! Every cursor ([`Duplicate`]) reads from a buffer shared by all cursors of
//! the same stream. The cursor that is in front pulls the next element from
//! the source and appends it to the buffer; cursors that are behind read the
//! buffered copy. A buffered element is released as soon as every live
//! cursor has passed it.
//!
//! A cursor that is kept alive without being advanced keeps all elements
//! after its position in memory. Callers must drop cursors they are no longer
//! interested in.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use itertools::Itertools;

use crate::errors::{GraphError, Result};

type Upstream<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

struct SharedBuffer<T> {
    /// `None` once the source is exhausted or has failed.
    upstream: Option<Upstream<T>>,
    elements: VecDeque<T>,
    /// Absolute position of the first element in `elements`.
    released: usize,
    /// Number of live cursors for each absolute position.
    cursors: BTreeMap<usize, usize>,
    failure: Option<String>,
}

impl<T: Clone> SharedBuffer<T> {
    fn new(upstream: Upstream<T>) -> SharedBuffer<T> {
        SharedBuffer {
            upstream: Some(upstream),
            elements: VecDeque::new(),
            released: 0,
            cursors: BTreeMap::new(),
            failure: None,
        }
    }

    fn register(&mut self, position: usize) {
        *self.cursors.entry(position).or_insert(0) += 1;
    }

    fn unregister(&mut self, position: usize) {
        if let Some(count) = self.cursors.get_mut(&position) {
            *count -= 1;
            if *count == 0 {
                self.cursors.remove(&position);
            }
        }
        self.release();
    }

    fn advance(&mut self, position: usize) {
        self.register(position + 1);
        self.unregister(position);
    }

    fn release(&mut self) {
        let end = self.released + self.elements.len();
        let min_position = self.cursors.keys().next().copied().unwrap_or(end);
        let mut count = 0;
        while self.released < min_position && self.elements.pop_front().is_some() {
            self.released += 1;
            count += 1;
        }
        if count > 0 {
            trace!(
                "released {} buffered elements, {} still buffered",
                count,
                self.elements.len()
            );
        }
    }

    fn element_at(&mut self, position: usize) -> Option<Result<T>> {
        let offset = match position.checked_sub(self.released) {
            Some(offset) => offset,
            None => {
                return Some(Err(GraphError::SharedStreamFailure(format!(
                    "cursor position {} was already released",
                    position
                ))))
            }
        };
        if let Some(item) = self.elements.get(offset) {
            return Some(Ok(item.clone()));
        }

        // The cursor is in front of all others and has to pull from the source.
        let upstream = match self.upstream.as_mut() {
            Some(upstream) => upstream,
            None => {
                return self
                    .failure
                    .as_ref()
                    .map(|msg| Err(GraphError::SharedStreamFailure(msg.clone())));
            }
        };
        match upstream.next() {
            Some(Ok(item)) => {
                self.elements.push_back(item.clone());
                Some(Ok(item))
            }
            Some(Err(e)) => {
                self.failure = Some(e.to_string());
                self.upstream = None;
                Some(Err(e))
            }
            None => {
                self.upstream = None;
                None
            }
        }
    }
}

/// An independent cursor into a shared [`Stream`].
///
/// Cloning a cursor creates a new cursor at the same position. Cursors can be
/// moved to and advanced from different threads; access to the shared buffer
/// is serialized.
pub struct Duplicate<T: Clone + Send + 'static> {
    shared: Arc<Mutex<SharedBuffer<T>>>,
    position: usize,
    finished: bool,
}

impl<T: Clone + Send + 'static> Duplicate<T> {
    fn lock_shared(&self) -> MutexGuard<'_, SharedBuffer<T>> {
        // Only used for bookkeeping that has to happen even after a consumer
        // panicked while holding the lock.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a new cursor at the current position of this cursor.
    pub fn duplicate(&self) -> Result<Duplicate<T>> {
        let mut shared = self.shared.lock()?;
        if !self.finished {
            shared.register(self.position);
        }
        Ok(Duplicate {
            shared: self.shared.clone(),
            position: self.position,
            finished: self.finished,
        })
    }

    /// Number of elements that have been consumed by this cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of elements currently held in the buffer shared by all cursors.
    pub fn buffered_len(&self) -> Result<usize> {
        let shared = self.shared.lock()?;
        Ok(shared.elements.len())
    }

    fn finish(&mut self, shared: &mut SharedBuffer<T>) {
        if !self.finished {
            self.finished = true;
            shared.unregister(self.position);
        }
    }
}

impl<T: Clone + Send + 'static> Iterator for Duplicate<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let shared = self.shared.clone();
        let mut guard = match shared.lock() {
            Ok(guard) => guard,
            Err(e) => {
                let error = GraphError::LockPoisoning(e.to_string());
                let mut guard = e.into_inner();
                self.finish(&mut guard);
                return Some(Err(error));
            }
        };
        match guard.element_at(self.position) {
            Some(Ok(item)) => {
                guard.advance(self.position);
                self.position += 1;
                Some(Ok(item))
            }
            Some(Err(e)) => {
                self.finish(&mut guard);
                Some(Err(e))
            }
            None => {
                self.finish(&mut guard);
                None
            }
        }
    }
}

impl<T: Clone + Send + 'static> Clone for Duplicate<T> {
    fn clone(&self) -> Self {
        let mut shared = self.lock_shared();
        if !self.finished {
            shared.register(self.position);
        }
        Duplicate {
            shared: self.shared.clone(),
            position: self.position,
            finished: self.finished,
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Duplicate<T> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            let position = self.position;
            self.lock_shared().unregister(position);
        }
    }
}

/// A lazily produced sequence that can be iterated any number of times.
///
/// The stream holds a cursor at the start of the sequence, so everything the
/// source produced stays buffered for as long as the stream itself is alive.
/// Each call to [`iter`](Stream::iter) replays the sequence from the start
/// and only pulls from the source when it is ahead of every earlier consumer.
pub struct Stream<T: Clone + Send + 'static> {
    origin: Duplicate<T>,
}

impl<T: Clone + Send + 'static> Stream<T> {
    /// Create a stream over the elements of `iter`.
    ///
    /// Nothing is pulled from `iter` before the first consumer asks for it.
    pub fn new<I>(iter: I) -> Stream<T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Stream::from_results(iter.into_iter().map(Ok))
    }

    /// Create a stream over a fallible source.
    ///
    /// The first error ends the stream for every cursor. The cursor that
    /// pulled the error receives it unchanged, all other cursors receive a
    /// [`GraphError::SharedStreamFailure`] with its message.
    pub fn from_results<I>(iter: I) -> Stream<T>
    where
        I: IntoIterator<Item = Result<T>>,
        I::IntoIter: Send + 'static,
    {
        let mut shared = SharedBuffer::new(Box::new(iter.into_iter()));
        shared.register(0);
        Stream {
            origin: Duplicate {
                shared: Arc::new(Mutex::new(shared)),
                position: 0,
                finished: false,
            },
        }
    }

    pub fn empty() -> Stream<T> {
        Stream::new(std::iter::empty())
    }

    /// A new cursor at the start of the sequence.
    pub fn iter(&self) -> Duplicate<T> {
        self.origin.clone()
    }

    /// Create a new stream whose source is computed from a fresh cursor into
    /// this stream.
    ///
    /// `f` is called immediately, but the returned iterator is not advanced
    /// until the new stream is consumed.
    pub fn derive<U, I, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + 'static,
        I: Iterator<Item = Result<U>> + Send + 'static,
        F: FnOnce(Duplicate<T>) -> I,
    {
        Stream::from_results(f(self.iter()))
    }

    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + Send + 'static,
    {
        self.derive(move |it| it.filter_ok(predicate))
    }

    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + 'static,
        F: Fn(T) -> U + Send + 'static,
    {
        self.derive(move |it| it.map_ok(f))
    }

    pub fn flat_map<U, I, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + 'static,
        I: IntoIterator<Item = U>,
        I::IntoIter: Send + 'static,
        F: Fn(T) -> I + Send + 'static,
    {
        self.derive(move |it| it.map_ok(move |x| f(x).into_iter()).flatten_ok())
    }

    /// All elements of this stream followed by all elements of `other`.
    pub fn chain(&self, other: &Stream<T>) -> Stream<T> {
        let other = other.iter();
        self.derive(move |it| it.chain(other))
    }

    /// Pull the whole sequence through a new cursor.
    pub fn collect_vec(&self) -> Result<Vec<T>> {
        self.iter().collect()
    }

    pub fn buffered_len(&self) -> Result<usize> {
        self.origin.buffered_len()
    }
}

impl<T: Clone + Send + 'static> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            origin: self.origin.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f.debug_struct("Stream");
        if let Ok(buffered) = self.buffered_len() {
            s.field("buffered", &buffered);
        }
        s.finish_non_exhaustive()
    }
}
