//! Backfill: seed a consumer with the most recent records of a symbol.

use codec::Codec;

use crate::{FileStore, StoreError};

impl<C: Codec> FileStore<C> {
    /// Returns the last `num_records` records of one date bucket.
    ///
    /// The bucket is the symbol's latest one, unless `before_date` is given
    /// and not after it, in which case it is the bucket strictly before
    /// `before_date` (falling back to the latest bucket if there is none).
    /// Only that single bucket is read, so fewer than `num_records` records
    /// may be returned.
    pub fn backfill(
        &mut self,
        symbol: &str,
        num_records: usize,
        before_date: Option<u64>,
    ) -> Result<Vec<C::Record>, StoreError> {
        let Some(last) = self.last(symbol)? else {
            return Ok(Vec::new());
        };

        let mut date = last.date;
        if let Some(before) = before_date.filter(|b| *b <= last.date) {
            if let Some(prev) = self.prev(symbol, before)? {
                date = prev.date;
            }
        }

        let mut records = self.read(symbol, date)?;
        let keep = num_records.min(records.len());
        Ok(records.split_off(records.len() - keep))
    }
}
