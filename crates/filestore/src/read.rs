//! Read path: `read()` and `read_range()`.
//!
//! A range read resolves its first date through the index, then walks
//! successor nodes, seeking to each block and decoding `count` records.
//! Blocks are visited in date order and each block was written sorted, so
//! the result is in date order, then natural order.

use codec::Codec;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use tracing::{trace, warn};

use crate::{FileStore, StoreError};

impl<C: Codec> FileStore<C> {
    /// Reads the block of a single date.
    pub fn read(&mut self, symbol: &str, date: u64) -> Result<Vec<C::Record>, StoreError> {
        self.read_range(symbol, date, date)
    }

    /// Reads every block from `from` through `through`, inclusive.
    ///
    /// `from` must be an indexed date; there is no nearest-date fallback.
    /// An unindexed `from` or an unknown symbol yields an empty result.
    ///
    /// A block that ends before `count` records is logged and read as far as
    /// it goes; use [`check_integrity`](FileStore::check_integrity) to find out
    /// why.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be loaded or the data file of an
    /// indexed symbol cannot be opened or read.
    pub fn read_range(
        &mut self,
        symbol: &str,
        from: u64,
        through: u64,
    ) -> Result<Vec<C::Record>, StoreError> {
        let path = self.data_path(symbol)?;
        let codec = &self.codec;
        let index = self.index.load(symbol)?;

        let mut records = Vec::new();
        let Some(mut node) = index.get(from) else {
            return Ok(records);
        };
        if node.date > through {
            return Ok(records);
        }

        let mut reader = BufReader::new(File::open(&path)?);

        loop {
            reader.seek(SeekFrom::Start(node.offset))?;
            let mut decoded = 0u32;
            while decoded < node.count {
                match codec.decode_one(&mut reader, symbol)? {
                    Some(record) => records.push(record),
                    None => break,
                }
                decoded += 1;
            }

            if decoded < node.count {
                warn!(
                    symbol,
                    date = node.date,
                    expected = node.count,
                    decoded,
                    "block ends before its indexed count"
                );
            }
            trace!(symbol, date = node.date, decoded, "read block");

            match index.next(node.date) {
                Some(next) if next.date <= through => node = next,
                _ => break,
            }
        }

        Ok(records)
    }
}
