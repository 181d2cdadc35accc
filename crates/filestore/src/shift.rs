//! Block relocation.
//!
//! Blocks are moved one at a time, each as a single read of the whole block
//! followed by a single write at `offset + delta`. The caller picks the
//! order so no move overwrites a block that has not moved yet:
//!
//! ```text
//! delta > 0 (grow / insert)  tail → head   [A][B][C]  →  [A]....[B][C]
//! delta < 0 (shrink)         head → tail   [A]..[B][C] →  [A][B][C]
//! ```
//!
//! The index node of a block is updated right after its bytes land, so on
//! failure the index describes exactly the blocks that were moved.

use codec::Codec;
use index::DateIndex;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::{trace, warn};

use crate::StoreError;

/// Moves the blocks of `dates` by `delta` bytes, in the order given.
///
/// Returns the number of blocks moved. On failure returns
/// [`StoreError::ShiftInterrupted`] carrying how many blocks were moved
/// before the one that failed.
pub(crate) fn relocate_blocks<C, F>(
    codec: &C,
    file: &mut F,
    index: &mut DateIndex,
    symbol: &str,
    dates: &[u64],
    delta: i64,
) -> Result<usize, StoreError>
where
    C: Codec,
    F: Read + Write + Seek,
{
    for (relocated, &date) in dates.iter().enumerate() {
        let moved = match index.get(date) {
            Some(node) => shift_bytes(file, node.offset, codec.block_size(node.count), delta),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("date {} vanished from the index during a shift", date),
            )),
        };

        if let Err(source) = moved {
            warn!(symbol, date, relocated, planned = dates.len(), "block shift interrupted");
            return Err(StoreError::ShiftInterrupted {
                symbol: symbol.to_string(),
                relocated,
                planned: dates.len(),
                source,
            });
        }

        index.shift_offset(date, delta);
        trace!(symbol, date, delta, "block relocated");
    }

    Ok(dates.len())
}

/// Copies `len` bytes at `offset` to `offset + delta` as one contiguous move.
pub(crate) fn shift_bytes<F>(file: &mut F, offset: u64, len: u64, delta: i64) -> io::Result<()>
where
    F: Read + Write + Seek,
{
    if len == 0 || delta == 0 {
        return Ok(());
    }

    let target = offset.checked_add_signed(delta).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot shift block at {} by {}", offset, delta),
        )
    })?;
    let len = usize::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "block too large to shift"))?;

    let mut bytes = vec![0u8; len];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut bytes)?;
    file.seek(SeekFrom::Start(target))?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Converts a byte count into a signed shift distance.
pub(crate) fn signed_delta(bytes: u64) -> io::Result<i64> {
    i64::try_from(bytes)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "shift distance too large"))
}
