use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::FeedForward;

type Queue<R> = Arc<Mutex<VecDeque<R>>>;

fn lock<R>(queue: &Queue<R>) -> MutexGuard<'_, VecDeque<R>> {
    // a panicking producer cannot leave a VecDeque half-pushed
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// FIFO of live records for one symbol.
///
/// Producers on other threads push through a [`Feeder`]; the owner drains
/// the queue with [`FeedForward::next`].
#[derive(Debug)]
pub struct AggregateBuffer<R> {
    symbol: String,
    queue: Queue<R>,
    last: Option<R>,
    prev: Option<R>,
    delivered: usize,
}

/// Cloneable, `Send` handle that appends to an [`AggregateBuffer`].
#[derive(Debug)]
pub struct Feeder<R> {
    symbol: String,
    queue: Queue<R>,
}

impl<R> Clone for Feeder<R> {
    fn clone(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<R: Debug> Feeder<R> {
    pub fn push(&self, record: R) {
        trace!(symbol = %self.symbol, ?record, "buffering record");
        lock(&self.queue).push_back(record);
    }
}

impl<R: Clone + Debug> AggregateBuffer<R> {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            queue: Arc::default(),
            last: None,
            prev: None,
            delivered: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn feeder(&self) -> Feeder<R> {
        Feeder {
            symbol: self.symbol.clone(),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn push(&self, record: R) {
        self.feeder().push(record);
    }

    /// The most recently delivered record.
    pub fn last(&self) -> Option<&R> {
        self.last.as_ref()
    }
}

impl<R: Clone + Debug> FeedForward<R> for AggregateBuffer<R> {
    fn next(&mut self) -> Option<R> {
        let record = lock(&self.queue).pop_front()?;
        trace!(symbol = %self.symbol, ?record, "captured record");
        self.prev = self.last.replace(record.clone());
        self.delivered += 1;
        Some(record)
    }

    fn prev(&self) -> Option<&R> {
        self.prev.as_ref()
    }

    /// Records waiting to be delivered.
    fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    fn position(&self) -> usize {
        self.delivered
    }

    fn clear(&mut self) {
        lock(&self.queue).clear();
        self.last = None;
        self.prev = None;
        self.delivered = 0;
    }
}
