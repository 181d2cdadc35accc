use crate::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use codec::{Codec, PriceBar, PriceBarCodec};
use config::StoreConfig;
use std::io::{self, Read};
use std::path::Path;

/// Minimal record for exercising block layout: ids are arbitrary per block,
/// natural order is `(date, id, price)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick {
    pub date: u64,
    pub id: u64,
    pub price: i64,
}

pub const TICK_BYTES: u64 = 24;

#[derive(Debug, Clone, Copy, Default)]
pub struct TickCodec;

impl Codec for TickCodec {
    type Record = Tick;

    fn record_size(&self) -> usize {
        TICK_BYTES as usize
    }

    fn encode(&self, t: &Tick, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_u64::<LittleEndian>(t.date)?;
        out.write_u64::<LittleEndian>(t.id)?;
        out.write_i64::<LittleEndian>(t.price)?;
        Ok(())
    }

    fn decode_one<R: Read>(&self, reader: &mut R, _symbol: &str) -> io::Result<Option<Tick>> {
        let mut raw = [0u8; TICK_BYTES as usize];
        match reader.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        let mut br = &raw[..];
        Ok(Some(Tick {
            date: br.read_u64::<LittleEndian>()?,
            id: br.read_u64::<LittleEndian>()?,
            price: br.read_i64::<LittleEndian>()?,
        }))
    }

    fn ordering_key(&self, t: &Tick) -> u64 {
        t.id
    }

    fn date_bucket(&self, t: &Tick) -> u64 {
        t.date
    }
}

pub fn tick_store(root: &Path) -> Result<FileStore<TickCodec>, StoreError> {
    FileStore::open(TickCodec, StoreConfig::under(root))
}

pub fn bar_store(root: &Path) -> Result<FileStore<PriceBarCodec>, StoreError> {
    FileStore::open(PriceBarCodec, StoreConfig::under(root))
}

pub fn ticks(date: u64, ids: &[u64]) -> Vec<Tick> {
    ids.iter()
        .map(|&id| Tick {
            date,
            id,
            price: (id as i64) * 100,
        })
        .collect()
}

pub fn ids(records: &[Tick]) -> Vec<u64> {
    records.iter().map(|t| t.id).collect()
}

/// `n` one-minute bars for `symbol` on `date`, starting at 09:30.
pub fn bars(symbol: &str, date: u64, n: u64) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let minute = 30 + i;
            let id = date * 10_000 + (9 + minute / 60) * 100 + minute % 60;
            let px = 100.0 + i as f64;
            PriceBar::new(symbol, id, px, px + 0.5, px - 0.5, px + 0.25, 1_000 + i)
        })
        .collect()
}

pub fn data_len<C: Codec>(store: &FileStore<C>, symbol: &str) -> u64 {
    std::fs::metadata(store.data_path(symbol).unwrap())
        .map(|m| m.len())
        .unwrap_or(0)
}

pub fn index_file<C: Codec>(store: &FileStore<C>, symbol: &str) -> String {
    std::fs::read_to_string(store.config().index_file(symbol).unwrap()).unwrap_or_default()
}
