//! Feed-forward consumers of the store's read API.
//!
//! A [`StorageBuffer`] replays one stored date bucket; an [`AggregateBuffer`]
//! drains records pushed by a live producer. Both hand records out one at a
//! time through [`FeedForward`].

mod aggregate;
mod storage;

pub use aggregate::{AggregateBuffer, Feeder};
pub use storage::StorageBuffer;

/// A cursor that only moves forward over a sequence of records.
pub trait FeedForward<R> {
    /// Delivers the next record, or `None` when nothing is available.
    fn next(&mut self) -> Option<R>;

    /// The record delivered before the most recent one.
    fn prev(&self) -> Option<&R>;

    /// Records held by the buffer.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records delivered so far.
    fn position(&self) -> usize;

    /// Drops all records and resets the cursor.
    fn clear(&mut self);
}
