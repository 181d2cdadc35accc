//! # Index - Date to Offset Index
//!
//! The only description of a data file's layout. Every symbol has one index
//! file holding one line per date bucket:
//!
//! ```text
//! 20240102,0,390
//! 20240103,18720,390
//! 20240104,37440,388
//! ```
//!
//! Each line is `date,offset,count`: the block for `date` starts at byte
//! `offset` of the symbol's data file and holds `count` fixed-size records.
//! There is no header and no trailing metadata.
//!
//! ## Structure
//!
//! | Type            | Purpose                                                   |
//! |-----------------|-----------------------------------------------------------|
//! | [`IndexNode`]   | One bucket's `(date, offset, count)` descriptor           |
//! | [`DateIndex`]   | Date-ordered nodes of one symbol plus a dirty flag        |
//! | [`SymbolIndex`] | Lazily loaded cache of `DateIndex` per symbol             |
//!
//! ## Tombstones
//!
//! A node with `count == 0` stays in memory so lookups within a session stay
//! consistent, but it is dropped whenever the index file is rewritten.
//!
//! ## Concurrency
//!
//! [`SymbolIndex`] is a plain cache with no internal locking. Callers sharing
//! it across threads wrap it (or the store that owns it) in a `Mutex`.
//! Concurrent writers in other processes are not detected.

mod date_index;
mod node;
mod symbol_index;

pub use date_index::DateIndex;
pub use node::{IndexNode, ParseNodeError};
pub use symbol_index::SymbolIndex;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or persisting index files.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An underlying I/O error (other than a missing index file).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The symbol cannot name an index file.
    #[error(transparent)]
    InvalidSymbol(anyhow::Error),

    /// A line of an index file could not be parsed.
    #[error("{}:{line}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParseNodeError,
    },
}
