use super::helpers::*;
use crate::*;
use anyhow::Result;
use std::fs::OpenOptions;
use tempfile::tempdir;

const D1: u64 = 20240102;
const D2: u64 = 20240103;
const D3: u64 = 20240104;

fn seeded(root: &std::path::Path) -> Result<FileStore<TickCodec>> {
    let mut store = tick_store(root)?;
    store.write("AAA", D1, ticks(D1, &[1, 2]))?;
    store.write("AAA", D2, ticks(D2, &[3, 4, 5]))?;
    store.write("AAA", D3, ticks(D3, &[6]))?;
    Ok(store)
}

#[test]
fn unknown_symbol_reads_empty() -> Result<()> {
    let dir = tempdir()?;
    let mut store = tick_store(dir.path())?;
    assert!(store.read("NOPE", D1)?.is_empty());
    assert!(store.read_range("NOPE", D1, D3)?.is_empty());
    Ok(())
}

#[test]
fn unindexed_start_date_has_no_nearest_fallback() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    // 20240101 precedes every bucket but is not itself a bucket
    assert!(store.read_range("AAA", 20240101, D3)?.is_empty());
    Ok(())
}

#[test]
fn range_stops_at_through_date() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    assert_eq!(ids(&store.read_range("AAA", D1, D2)?), vec![1, 2, 3, 4, 5]);
    assert_eq!(ids(&store.read_range("AAA", D2, D3)?), vec![3, 4, 5, 6]);
    Ok(())
}

#[test]
fn through_date_need_not_be_indexed() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    assert_eq!(ids(&store.read_range("AAA", D1, 20240105)?), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(ids(&store.read_range("AAA", D1, 99991231)?), vec![1, 2, 3, 4, 5, 6]);
    Ok(())
}

#[test]
fn inverted_range_is_empty() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;
    assert!(store.read_range("AAA", D3, D1)?.is_empty());
    Ok(())
}

#[test]
fn single_date_read_excludes_neighbours() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;
    assert_eq!(ids(&store.read("AAA", D2)?), vec![3, 4, 5]);
    Ok(())
}

#[test]
fn truncated_block_reads_what_is_there() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    // chop the last record and half of the one before it
    let f = OpenOptions::new().write(true).open(store.data_path("AAA")?)?;
    f.set_len(4 * TICK_BYTES + TICK_BYTES / 2)?;
    drop(f);

    assert_eq!(ids(&store.read_range("AAA", D1, D3)?), vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
fn missing_data_file_for_indexed_symbol_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    std::fs::remove_file(store.data_path("AAA")?)?;
    let err = store.read("AAA", D1).unwrap_err();
    assert!(matches!(err, StoreError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    Ok(())
}

#[test]
fn reads_from_a_fresh_store_load_the_persisted_index() -> Result<()> {
    let dir = tempdir()?;
    drop(seeded(dir.path())?);

    let mut store = tick_store(dir.path())?;
    assert!(!store.index().is_loaded("AAA"));
    assert_eq!(ids(&store.read_range("AAA", D1, D3)?), vec![1, 2, 3, 4, 5, 6]);
    assert!(store.index().is_loaded("AAA"));
    Ok(())
}

#[test]
fn index_introspection() -> Result<()> {
    let dir = tempdir()?;
    let mut store = seeded(dir.path())?;

    assert_eq!(store.first("AAA")?.unwrap().date, D1);
    assert_eq!(store.last("AAA")?.unwrap().date, D3);
    assert_eq!(store.next("AAA", D1)?.unwrap().date, D2);
    assert_eq!(store.prev("AAA", D3)?.unwrap().date, D2);
    assert!(store.prev("AAA", D1)?.is_none());
    assert!(store.next("AAA", D3)?.is_none());
    assert!(store.first("NOPE")?.is_none());
    Ok(())
}
