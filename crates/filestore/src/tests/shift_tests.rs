use super::helpers::*;
use crate::shift::{relocate_blocks, shift_bytes, signed_delta};
use crate::StoreError;
use anyhow::Result;
use index::{DateIndex, IndexNode};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

/// A cursor that refuses writes once its budget is spent.
struct FailingFile {
    inner: Cursor<Vec<u8>>,
    writes_left: usize,
}

impl Read for FailingFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for FailingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.writes_left == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.writes_left -= 1;
        self.inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for FailingFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Three two-record blocks laid out back to back, each byte tagged with its block.
fn three_blocks() -> (Vec<u8>, DateIndex) {
    let mut bytes = Vec::new();
    for tag in [b'A', b'B', b'C'] {
        bytes.extend(std::iter::repeat(tag).take(2 * TICK_BYTES as usize));
    }
    let index = [
        IndexNode::new(1, 0, 2),
        IndexNode::new(2, 48, 2),
        IndexNode::new(3, 96, 2),
    ]
    .into_iter()
    .collect();
    (bytes, index)
}

#[test]
fn shift_forward_and_back() -> Result<()> {
    let mut file = Cursor::new(b"abcdef".to_vec());

    shift_bytes(&mut file, 2, 4, 3)?;
    assert_eq!(file.get_ref().as_slice(), b"abcdecdef");

    shift_bytes(&mut file, 5, 4, -3)?;
    assert_eq!(file.get_ref().as_slice(), b"abcdefdef");
    Ok(())
}

#[test]
fn zero_length_or_distance_is_a_no_op() -> Result<()> {
    let mut file = Cursor::new(b"abc".to_vec());
    shift_bytes(&mut file, 0, 0, 10)?;
    shift_bytes(&mut file, 0, 3, 0)?;
    assert_eq!(file.get_ref().as_slice(), b"abc");
    Ok(())
}

#[test]
fn shifting_before_start_of_file_is_rejected() {
    let mut file = Cursor::new(b"abc".to_vec());
    let err = shift_bytes(&mut file, 1, 2, -2).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn delta_must_fit_in_i64() {
    assert_eq!(signed_delta(48).unwrap(), 48);
    assert!(signed_delta(u64::MAX).is_err());
}

#[test]
fn relocate_tail_first_opens_a_gap() -> Result<()> {
    let (bytes, mut index) = three_blocks();
    let mut file = Cursor::new(bytes);

    let moved = relocate_blocks(&TickCodec, &mut file, &mut index, "AAA", &[3, 2], 48)?;
    assert_eq!(moved, 2);
    assert_eq!(index.get(2).unwrap().offset, 96);
    assert_eq!(index.get(3).unwrap().offset, 144);
    assert!(index.is_dirty());

    let data = file.into_inner();
    assert_eq!(data.len(), 192);
    assert!(data[96..144].iter().all(|&b| b == b'B'));
    assert!(data[144..192].iter().all(|&b| b == b'C'));
    Ok(())
}

#[test]
fn relocate_head_first_closes_a_gap() -> Result<()> {
    let mut bytes = vec![b'A'; 48];
    bytes.extend([0u8; 24]);
    bytes.extend([b'B'; 48]);
    bytes.extend([b'C'; 48]);
    let mut index: DateIndex = [
        IndexNode::new(1, 0, 2),
        IndexNode::new(2, 72, 2),
        IndexNode::new(3, 120, 2),
    ]
    .into_iter()
    .collect();
    let mut file = Cursor::new(bytes);

    relocate_blocks(&TickCodec, &mut file, &mut index, "AAA", &[2, 3], -24)?;
    assert_eq!(index.get(2).unwrap().offset, 48);
    assert_eq!(index.get(3).unwrap().offset, 96);

    let data = file.into_inner();
    assert!(data[48..96].iter().all(|&b| b == b'B'));
    assert!(data[96..144].iter().all(|&b| b == b'C'));
    Ok(())
}

#[test]
fn interrupted_relocation_reports_progress() {
    let (bytes, mut index) = three_blocks();
    let mut file = FailingFile {
        inner: Cursor::new(bytes),
        writes_left: 1,
    };

    let err = relocate_blocks(&TickCodec, &mut file, &mut index, "AAA", &[3, 2], 24).unwrap_err();
    match err {
        StoreError::ShiftInterrupted {
            ref symbol,
            relocated,
            planned,
            ..
        } => {
            assert_eq!(symbol, "AAA");
            assert_eq!(relocated, 1);
            assert_eq!(planned, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // the moved block is indexed at its new home, the other is untouched
    assert_eq!(index.get(3).unwrap().offset, 120);
    assert_eq!(index.get(2).unwrap().offset, 48);
    assert_eq!(index.get(1).unwrap().offset, 0);

    let data = file.inner.into_inner();
    assert!(data[120..168].iter().all(|&b| b == b'C'));
    assert!(data[48..96].iter().all(|&b| b == b'B'));
}

#[test]
fn relocating_an_unindexed_date_fails_without_moving() {
    let (bytes, mut index) = three_blocks();
    let mut file = Cursor::new(bytes.clone());

    let err = relocate_blocks(&TickCodec, &mut file, &mut index, "AAA", &[9], 24).unwrap_err();
    assert!(matches!(
        err,
        StoreError::ShiftInterrupted { relocated: 0, planned: 1, .. }
    ));
    assert_eq!(file.into_inner(), bytes);
}
