use codec::Codec;
use filestore::{FileStore, StoreError};
use tracing::debug;

use crate::FeedForward;

/// Replays the records of a single date bucket in stored order.
#[derive(Debug, Clone)]
pub struct StorageBuffer<R> {
    records: Vec<R>,
    pos: usize,
}

impl<R: Clone> StorageBuffer<R> {
    /// Reads `date` for `symbol` from `store`. An unindexed date gives an
    /// empty buffer.
    pub fn new<C>(store: &mut FileStore<C>, symbol: &str, date: u64) -> Result<Self, StoreError>
    where
        C: Codec<Record = R>,
    {
        let records = store.read(symbol, date)?;
        debug!(symbol, date, records = records.len(), "storage buffer loaded");
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<R>) -> Self {
        Self { records, pos: 0 }
    }

    /// Records not yet delivered.
    pub fn remaining(&self) -> usize {
        self.records.len() - self.pos
    }
}

impl<R: Clone> FeedForward<R> for StorageBuffer<R> {
    fn next(&mut self) -> Option<R> {
        let record = self.records.get(self.pos)?.clone();
        self.pos += 1;
        Some(record)
    }

    /// Stays two behind the cursor once the buffer is exhausted, so polls
    /// past the end never move it onto the last record.
    fn prev(&self) -> Option<&R> {
        self.records.get(self.pos.checked_sub(2)?)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn clear(&mut self) {
        self.records.clear();
        self.pos = 0;
    }
}
