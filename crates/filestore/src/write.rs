//! Write path: `write()`.
//!
//! A write replaces the whole block of one date. Depending on what the index
//! already holds, the block is appended, inserted mid-file, grown, shrunk, or
//! rewritten in place. Deleting a date is a write of zero records.

use codec::Codec;
use index::IndexNode;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use tracing::{debug, warn};

use crate::shift::{relocate_blocks, signed_delta};
use crate::{FileStore, StoreError};

/// What a [`FileStore::write`] did to the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Empty write for a date that was never indexed; nothing changed.
    Skipped,
    /// New block written after the last one.
    Appended,
    /// New block written before existing ones, moving `shifted` later blocks.
    Inserted { shifted: usize },
    /// Existing block enlarged, moving `shifted` later blocks forward.
    Grown { shifted: usize },
    /// Existing block reduced (possibly to zero records), moving `shifted`
    /// later blocks back and truncating the file.
    Shrunk { shifted: usize },
    /// Existing block rewritten with the same number of records.
    Replaced,
}

impl<C: Codec> FileStore<C> {
    /// Replaces the block of `date` with `records`.
    ///
    /// Records are sorted before they are written. Writing an empty list for
    /// an indexed date shrinks its block to zero records, which deletes it:
    /// the node stays in memory as a tombstone and disappears from the index
    /// file on persist.
    ///
    /// # Steps
    ///
    /// 1. Validate the symbol, the record count, and every record's date.
    /// 2. Sort and encode the records.
    /// 3. Open (or create) the data file.
    /// 4. Move later blocks so the new block fits exactly (see [`WriteOutcome`]).
    /// 5. Write the encoded block at its offset.
    /// 6. Persist every dirty index.
    ///
    /// # Errors
    ///
    /// On any failure after step 3 the index is left dirty and is **not**
    /// persisted. [`StoreError::ShiftInterrupted`] reports how far a block
    /// move got.
    pub fn write(
        &mut self,
        symbol: &str,
        date: u64,
        mut records: Vec<C::Record>,
    ) -> Result<WriteOutcome, StoreError> {
        let path = self.data_path(symbol)?;

        let count = u32::try_from(records.len()).map_err(|_| StoreError::TooManyRecords {
            symbol: symbol.to_string(),
            date,
            count: records.len(),
        })?;

        if let Some(found) = records
            .iter()
            .map(|r| self.codec.date_bucket(r))
            .find(|d| *d != date)
        {
            return Err(StoreError::DateMismatch {
                symbol: symbol.to_string(),
                date,
                found,
            });
        }

        let existing = self.index.load(symbol)?.get(date);
        if existing.is_none() && records.is_empty() {
            debug!(symbol, date, "empty write for unindexed date");
            return Ok(WriteOutcome::Skipped);
        }

        records.sort();
        self.buf.clear();
        for record in &records {
            self.codec.encode(record, &mut self.buf)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let result = match existing {
            None => self.place_new_block(symbol, date, count, &mut file),
            Some(node) => self.resize_block(symbol, node, count, &mut file),
        }
        .and_then(|(offset, outcome)| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&self.buf)?;
            Ok(outcome)
        });

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(symbol, date, error = %e, "write failed; index left unpersisted");
                return Err(e);
            }
        };

        self.index.load(symbol)?.mark_dirty();
        self.index.persist()?;

        debug!(symbol, date, records = count, ?outcome, "wrote block");
        Ok(outcome)
    }

    /// Picks the offset of a date that is not indexed yet, moving later
    /// blocks forward when it belongs before them, and indexes it.
    fn place_new_block(
        &mut self,
        symbol: &str,
        date: u64,
        count: u32,
        file: &mut File,
    ) -> Result<(u64, WriteOutcome), StoreError> {
        let codec = &self.codec;
        let index = self.index.load(symbol)?;
        let candidate = IndexNode::new(date, 0, count);

        let (offset, outcome) = match index.last() {
            None => (0, WriteOutcome::Appended),
            Some(last) if candidate.is_after(&last) => (
                last.offset + codec.block_size(last.count),
                WriteOutcome::Appended,
            ),
            Some(_) => {
                // tail first so nothing is overwritten before it moves
                let mut later = index.dates_after(date);
                later.reverse();

                let delta = signed_delta(codec.block_size(count))?;
                let shifted = relocate_blocks(codec, file, index, symbol, &later, delta)?;

                let offset = match index.prev(date) {
                    Some(prev) => prev.offset + codec.block_size(prev.count),
                    None => 0,
                };
                (offset, WriteOutcome::Inserted { shifted })
            }
        };

        index.insert(IndexNode { offset, ..candidate });
        Ok((offset, outcome))
    }

    /// Grows or shrinks an indexed block to `count` records, moving every
    /// later block by the difference.
    fn resize_block(
        &mut self,
        symbol: &str,
        node: IndexNode,
        count: u32,
        file: &mut File,
    ) -> Result<(u64, WriteOutcome), StoreError> {
        let codec = &self.codec;
        let index = self.index.load(symbol)?;

        let outcome = if count > node.count {
            let mut later = index.dates_after(node.date);
            later.reverse();

            let delta = signed_delta(codec.block_size(count - node.count))?;
            let shifted = relocate_blocks(codec, file, index, symbol, &later, delta)?;
            index.set_count(node.date, count);
            WriteOutcome::Grown { shifted }
        } else if count < node.count {
            let later = index.dates_after(node.date);

            let delta = -signed_delta(codec.block_size(node.count - count))?;
            let shifted = relocate_blocks(codec, file, index, symbol, &later, delta)?;
            index.set_count(node.date, count);

            // end of the last block, which is also old EOF - |delta| when the
            // shrunk block is the last one
            let end = index
                .last()
                .map(|n| n.offset + codec.block_size(n.count))
                .unwrap_or(0);
            file.set_len(end)?;
            WriteOutcome::Shrunk { shifted }
        } else {
            WriteOutcome::Replaced
        };

        Ok((node.offset, outcome))
    }
}
