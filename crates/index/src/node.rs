use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Location of one date bucket inside a symbol's data file.
///
/// `offset` is the byte position of the block's first record and `count`
/// the number of fixed-size records stored contiguously from there. A node
/// with `count == 0` is a tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexNode {
    pub date: u64,
    pub offset: u64,
    pub count: u32,
}

/// A line that is not `date,offset,count`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed index line '{0}' (expected 'date,offset,count')")]
pub struct ParseNodeError(pub String);

impl IndexNode {
    pub fn new(date: u64, offset: u64, count: u32) -> Self {
        Self {
            date,
            offset,
            count,
        }
    }

    #[must_use]
    pub fn is_before(&self, other: &IndexNode) -> bool {
        self.date < other.date
    }

    #[must_use]
    pub fn is_after(&self, other: &IndexNode) -> bool {
        self.date > other.date
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.count == 0
    }

    /// Moves the node by `delta` bytes. Used when a neighbouring block grows,
    /// shrinks, or is inserted in front of this one.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the offset would leave the `u64` range,
    /// which only happens if the index is already corrupt.
    pub fn shift_offset(&mut self, delta: i64) {
        debug_assert!(
            self.offset.checked_add_signed(delta).is_some(),
            "offset overflow shifting {:?} by {}",
            self,
            delta
        );
        self.offset = self.offset.wrapping_add_signed(delta);
    }

    /// Renders the node as one index-file line, without the line break.
    pub fn to_csv(&self) -> String {
        self.to_string()
    }

    /// Parses one index-file line.
    pub fn from_csv(line: &str) -> Result<Self, ParseNodeError> {
        line.parse()
    }
}

impl fmt::Display for IndexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.date, self.offset, self.count)
    }
}

impl FromStr for IndexNode {
    type Err = ParseNodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ParseNodeError(trimmed.to_string());

        let mut fields = trimmed.split(',').map(str::trim);
        let date = fields.next().ok_or_else(err)?;
        let offset = fields.next().ok_or_else(err)?;
        let count = fields.next().ok_or_else(err)?;
        if fields.next().is_some() {
            return Err(err());
        }

        Ok(Self {
            date: date.parse().map_err(|_| err())?,
            offset: offset.parse().map_err(|_| err())?,
            count: count.parse().map_err(|_| err())?,
        })
    }
}
