//! Integrity check: a read-only linear scan of a data file against its index.

use codec::Codec;
use index::IndexNode;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader};
use tracing::debug;

use crate::{FileStore, IntegrityViolation, StoreError};

/// Totals of a clean integrity scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Records decoded from the data file.
    pub records: u64,
    /// Distinct date blocks encountered.
    pub blocks: usize,
}

impl<C: Codec> FileStore<C> {
    /// Scans `symbol`'s data file from offset 0 and verifies that:
    ///
    /// - ordering keys increase strictly across the whole file;
    /// - every date found in the file has an index node;
    /// - each date's run of records matches its node's `count`, including
    ///   the final run at end of data;
    /// - every live node has records in the file.
    ///
    /// Neither the file nor the index is modified. A symbol with no data
    /// file and no live index nodes is reported clean.
    ///
    /// # Errors
    ///
    /// [`StoreError::Integrity`] names the symbol and the first violation
    /// found; I/O failures are reported as [`StoreError::Io`].
    pub fn check_integrity(&mut self, symbol: &str) -> Result<IntegrityReport, StoreError> {
        let path = self.data_path(symbol)?;
        let codec = &self.codec;
        let index = self.index.load(symbol)?;

        let fail = |violation: IntegrityViolation| StoreError::Integrity {
            symbol: symbol.to_string(),
            violation,
        };

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound && index.live().next().is_none() => {
                return Ok(IntegrityReport::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);

        let mut report = IntegrityReport::default();
        let mut last_id: Option<u64> = None;
        let mut reached = HashSet::new();
        // node of the date being tallied, and its tally so far
        let mut current: Option<(IndexNode, u64)> = None;

        let check_tally = |node: &IndexNode, tally: u64| {
            if tally == u64::from(node.count) {
                Ok(())
            } else {
                Err(IntegrityViolation::CountMismatch {
                    date: node.date,
                    indexed: node.count,
                    found: tally,
                })
            }
        };

        while let Some(record) = codec.decode_one(&mut reader, symbol)? {
            let date = codec.date_bucket(&record);
            let id = codec.ordering_key(&record);

            current = match current {
                Some((node, tally)) if node.date == date => Some((node, tally + 1)),
                previous => {
                    if let Some((node, tally)) = previous {
                        check_tally(&node, tally).map_err(fail)?;
                    }
                    let node = index
                        .get(date)
                        .ok_or_else(|| fail(IntegrityViolation::UnresolvedNode { date }))?;
                    reached.insert(date);
                    report.blocks += 1;
                    Some((node, 1))
                }
            };

            if let Some(previous) = last_id {
                if id <= previous {
                    return Err(fail(IntegrityViolation::NonIncreasingId { date, id, previous }));
                }
            }
            last_id = Some(id);
            report.records += 1;
        }

        if let Some((node, tally)) = current {
            check_tally(&node, tally).map_err(fail)?;
        }

        // live blocks whose records never showed up in the file
        if let Some(node) = index.live().find(|n| !reached.contains(&n.date)) {
            return Err(fail(IntegrityViolation::CountMismatch {
                date: node.date,
                indexed: node.count,
                found: 0,
            }));
        }

        debug!(symbol, records = report.records, blocks = report.blocks, "integrity check passed");
        Ok(report)
    }
}
