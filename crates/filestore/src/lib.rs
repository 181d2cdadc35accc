//! # FileStore - Per-Symbol Block Store
//!
//! Keeps one flat data file per symbol holding fixed-size records grouped
//! into **blocks**, one block per date, stored in ascending date order. The
//! [`index`] crate maps each date to its block's `(offset, count)`; the data
//! file itself has no header or footer.
//!
//! ```text
//! data/bars/AAA
//! ┌──────────────┬────────────────────┬──────────────┐
//! │ 20220103 × 3 │ 20220104 × 3       │ 20220105 × 3 │
//! └──────────────┴────────────────────┴──────────────┘
//! 0              144                  288            432
//!
//! data/index/AAA.csv
//! 20220103,0,3
//! 20220104,144,3
//! 20220105,288,3
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                 |
//! |---------------|---------------------------------------------------------|
//! | [`lib.rs`]    | `FileStore` struct, constructor, index introspection    |
//! | [`write`]     | `write()`: append, insert, grow, shrink, delete          |
//! | [`shift`]     | Block relocation with partial-failure accounting        |
//! | [`read`]      | `read()`, `read_range()`                                |
//! | [`integrity`] | `check_integrity()` linear scan                         |
//! | [`backfill`]  | `backfill()`: tail of the latest (or an earlier) bucket |
//!
//! ## Invariants
//!
//! 1. Every live node's `offset` is where its block starts on disk, and the
//!    block holds exactly `count` records.
//! 2. Blocks are contiguous and in date order; records inside a block are
//!    sorted by the record type's natural order.
//!
//! Writes keep both by moving neighbouring blocks in place rather than
//! rewriting the file.
//!
//! ## Failure Model
//!
//! There is no undo log. A write that fails while relocating blocks reports
//! how many blocks were moved ([`StoreError::ShiftInterrupted`]) and leaves
//! the in-memory index dirty and unpersisted. A later successful write
//! persists every dirty symbol, including that one.
//!
//! ## Concurrency
//!
//! Single writer per symbol. All operations take `&mut self`; share a store
//! across threads by wrapping it in a `Mutex`. Other processes writing the
//! same files produce undefined results.

mod backfill;
mod error;
mod integrity;
mod read;
mod shift;
mod write;

pub use error::{IntegrityViolation, StoreError};
pub use integrity::IntegrityReport;
pub use write::WriteOutcome;

use codec::Codec;
use config::StoreConfig;
use index::{IndexNode, SymbolIndex};
use std::path::PathBuf;

/// A block store for one record type, rooted at a [`StoreConfig`].
pub struct FileStore<C: Codec> {
    pub(crate) codec: C,
    pub(crate) config: StoreConfig,
    pub(crate) index: SymbolIndex,
    /// Reusable scratch buffer for encoding blocks.
    pub(crate) buf: Vec<u8>,
}

impl<C: Codec> std::fmt::Debug for FileStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("data_dir", &self.config.data_dir)
            .field("index_dir", &self.config.index_dir)
            .field("record_size", &self.codec.record_size())
            .field("loaded_symbols", &self.index.loaded_symbols().count())
            .finish()
    }
}

impl<C: Codec> FileStore<C> {
    /// Opens a store, creating its data and index directories if needed.
    /// Nothing is loaded until a symbol is first touched.
    pub fn open(codec: C, config: StoreConfig) -> Result<Self, StoreError> {
        config.ensure_dirs()?;
        let index = SymbolIndex::new(&config.index_dir);
        Ok(Self {
            codec,
            config,
            index,
            buf: Vec::new(),
        })
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The symbol index, for read-only inspection.
    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// The symbol index, for callers that repair or persist it directly.
    pub fn index_mut(&mut self) -> &mut SymbolIndex {
        &mut self.index
    }

    /// Path of `symbol`'s data file.
    pub fn data_path(&self, symbol: &str) -> Result<PathBuf, StoreError> {
        Ok(self.config.data_file(symbol)?)
    }

    /// Exact-date lookup of `symbol`'s index.
    pub fn lookup(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, StoreError> {
        config::validate_symbol(symbol)?;
        Ok(self.index.lookup(symbol, date)?)
    }

    /// The earliest indexed date bucket of `symbol`.
    pub fn first(&mut self, symbol: &str) -> Result<Option<IndexNode>, StoreError> {
        config::validate_symbol(symbol)?;
        Ok(self.index.first(symbol)?)
    }

    /// The latest indexed date bucket of `symbol`.
    pub fn last(&mut self, symbol: &str) -> Result<Option<IndexNode>, StoreError> {
        config::validate_symbol(symbol)?;
        Ok(self.index.last(symbol)?)
    }

    /// The bucket strictly before `date`.
    pub fn prev(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, StoreError> {
        config::validate_symbol(symbol)?;
        Ok(self.index.prev(symbol, date)?)
    }

    /// The bucket strictly after `date`.
    pub fn next(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, StoreError> {
        config::validate_symbol(symbol)?;
        Ok(self.index.next(symbol, date)?)
    }

    /// Persists every dirty symbol index. Returns the number of files written.
    pub fn persist(&mut self) -> Result<usize, StoreError> {
        Ok(self.index.persist()?)
    }

    /// Drops `symbol`'s cached index; the next operation reloads it from disk.
    pub fn evict(&mut self, symbol: &str) {
        self.index.evict(symbol);
    }
}

#[cfg(test)]
mod tests;
