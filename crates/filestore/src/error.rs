use index::IndexError;
use std::io;
use thiserror::Error;

/// Errors returned by [`FileStore`](crate::FileStore) operations.
///
/// Missing data (an unindexed date, a symbol never written) is not an error;
/// reads return an empty result instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An underlying I/O error on the data file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The symbol's index file could not be loaded or persisted.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Invalid symbol or store location.
    #[error(transparent)]
    Config(#[from] anyhow::Error),

    /// A record's date bucket does not match the date being written.
    #[error("[{symbol}] record for date {found} cannot be written to date {date}")]
    DateMismatch { symbol: String, date: u64, found: u64 },

    /// More records than a single block can index.
    #[error("[{symbol}] {count} records for date {date} exceed the block limit")]
    TooManyRecords {
        symbol: String,
        date: u64,
        count: usize,
    },

    /// A block relocation failed part way through.
    ///
    /// The first `relocated` blocks were moved and their index offsets
    /// updated; the block that failed may be partially copied. The in-memory
    /// index is dirty and has not been persisted.
    #[error("[{symbol}] shift interrupted after relocating {relocated} of {planned} blocks: {source}")]
    ShiftInterrupted {
        symbol: String,
        relocated: usize,
        planned: usize,
        #[source]
        source: io::Error,
    },

    /// The data file disagrees with its index.
    #[error("[{symbol}] {violation}")]
    Integrity {
        symbol: String,
        violation: IntegrityViolation,
    },
}

impl StoreError {
    /// The integrity violation, if this is an integrity failure.
    pub fn violation(&self) -> Option<&IntegrityViolation> {
        match self {
            StoreError::Integrity { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// An invariant broken by a data file, found by
/// [`FileStore::check_integrity`](crate::FileStore::check_integrity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("non-increasing ID {id} (previous {previous}) detected for date {date}")]
    NonIncreasingId { date: u64, id: u64, previous: u64 },

    #[error("index count mismatch for date {date}: index has {indexed}, file has {found}")]
    CountMismatch { date: u64, indexed: u32, found: u64 },

    #[error("unable to resolve index node for date {date}")]
    UnresolvedNode { date: u64 },
}
