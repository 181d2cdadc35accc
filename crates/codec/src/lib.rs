//! # Codec - Fixed-Size Record Serialization
//!
//! Defines the [`Codec`] contract the file store is generic over, and the
//! concrete [`PriceBar`] record with its [`PriceBarCodec`].
//!
//! A codec turns one record into a fixed number of bytes and back. The store
//! never looks inside those bytes: it only needs the record size (to compute
//! block boundaries), the record's **ordering key** (for integrity checks)
//! and its **date bucket** (the block a record belongs to).
//!
//! ## Price Bar Layout
//!
//! ```text
//! [id: u64 LE][open: f64 LE][high: f64 LE][low: f64 LE][close: f64 LE][volume: u64 LE]
//! ```
//!
//! 48 bytes per bar. The symbol is not stored; the caller supplies it on
//! decode since one data file holds exactly one symbol.
//!
//! ## Example
//!
//! ```rust
//! use codec::{Codec, PriceBar, PriceBarCodec};
//! use std::io::Cursor;
//!
//! let codec = PriceBarCodec;
//! let bar = PriceBar::new("AAA", 202401020931, 10.0, 10.5, 9.5, 10.25, 1200);
//!
//! let mut buf = Vec::new();
//! codec.encode(&bar, &mut buf).unwrap();
//! assert_eq!(buf.len(), codec.record_size());
//!
//! let decoded = codec.decode_one(&mut Cursor::new(buf), "AAA").unwrap();
//! assert_eq!(decoded, Some(bar));
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Ordering;
use std::io::{self, Read};

/// Serialization contract for the fixed-size records held in a data file.
///
/// Records are sorted with their [`Ord`] implementation before a block is
/// written. That order is independent of [`ordering_key`](Codec::ordering_key),
/// which is only used to verify that a file is monotonic.
pub trait Codec {
    /// The record type this codec reads and writes.
    type Record: Ord;

    /// Size in bytes of one encoded record.
    fn record_size(&self) -> usize;

    /// Size in bytes of `count` contiguous records.
    fn block_size(&self, count: u32) -> u64 {
        self.record_size() as u64 * u64::from(count)
    }

    /// Appends the encoded form of `record` to `out`.
    ///
    /// Exactly [`record_size`](Codec::record_size) bytes must be appended.
    /// Callers reuse `out` across calls to avoid an allocation per record.
    fn encode(&self, record: &Self::Record, out: &mut Vec<u8>) -> io::Result<()>;

    /// Reads one record from the current position of `reader`.
    ///
    /// Returns `Ok(None)` when fewer than `record_size()` bytes remain,
    /// including a clean EOF. Only genuine I/O failures are errors.
    fn decode_one<R: Read>(&self, reader: &mut R, symbol: &str)
        -> io::Result<Option<Self::Record>>;

    /// Monotonic id of the record within its symbol's file.
    fn ordering_key(&self, record: &Self::Record) -> u64;

    /// The date bucket (block key) the record belongs to.
    fn date_bucket(&self, record: &Self::Record) -> u64;
}

/// A single OHLCV price bar.
///
/// `id` encodes the bar's minute as `yyyymmddHHMM`, so it increases
/// strictly within a symbol and also carries the bar's date and time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub id: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        symbol: impl Into<String>,
        id: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            id,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// The bar's calendar date as `yyyymmdd`.
    #[must_use]
    pub fn date(&self) -> u64 {
        Self::date_from_id(self.id)
    }

    /// The bar's minute of day as `HHMM`.
    #[must_use]
    pub fn time(&self) -> u64 {
        Self::time_from_id(self.id)
    }

    #[must_use]
    pub fn date_from_id(id: u64) -> u64 {
        id / 10_000
    }

    #[must_use]
    pub fn time_from_id(id: u64) -> u64 {
        id % 10_000
    }
}

// Prices are never NaN.
impl Eq for PriceBar {}

impl Ord for PriceBar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.symbol.cmp(&other.symbol))
            .then_with(|| self.open.total_cmp(&other.open))
            .then_with(|| self.high.total_cmp(&other.high))
            .then_with(|| self.low.total_cmp(&other.low))
            .then_with(|| self.close.total_cmp(&other.close))
            .then_with(|| self.volume.cmp(&other.volume))
    }
}

impl PartialOrd for PriceBar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Size of one encoded [`PriceBar`]: six 8-byte fields.
pub const PRICE_BAR_BYTES: usize = 48;

/// Little-endian codec for [`PriceBar`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceBarCodec;

impl Codec for PriceBarCodec {
    type Record = PriceBar;

    fn record_size(&self) -> usize {
        PRICE_BAR_BYTES
    }

    fn encode(&self, bar: &PriceBar, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_u64::<LittleEndian>(bar.id)?;
        out.write_f64::<LittleEndian>(bar.open)?;
        out.write_f64::<LittleEndian>(bar.high)?;
        out.write_f64::<LittleEndian>(bar.low)?;
        out.write_f64::<LittleEndian>(bar.close)?;
        out.write_u64::<LittleEndian>(bar.volume)?;
        Ok(())
    }

    fn decode_one<R: Read>(&self, reader: &mut R, symbol: &str) -> io::Result<Option<PriceBar>> {
        let mut raw = [0u8; PRICE_BAR_BYTES];
        match reader.read_exact(&mut raw) {
            Ok(()) => {}
            // short tail or clean EOF
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        let mut br = &raw[..];
        Ok(Some(PriceBar {
            symbol: symbol.to_string(),
            id: br.read_u64::<LittleEndian>()?,
            open: br.read_f64::<LittleEndian>()?,
            high: br.read_f64::<LittleEndian>()?,
            low: br.read_f64::<LittleEndian>()?,
            close: br.read_f64::<LittleEndian>()?,
            volume: br.read_u64::<LittleEndian>()?,
        }))
    }

    fn ordering_key(&self, bar: &PriceBar) -> u64 {
        bar.id
    }

    fn date_bucket(&self, bar: &PriceBar) -> u64 {
        bar.date()
    }
}
