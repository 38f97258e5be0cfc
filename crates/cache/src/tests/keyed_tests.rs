use super::helpers::{mem_writer, reader_from};
use crate::*;
use anyhow::Result;
use offsets::IndexError;
use std::io::{self, Read, Write};
use storage::{Record, Storage};
use tempfile::tempdir;

// -------------------- Round trips --------------------

#[test]
fn fresh_reader_returns_identical_records() -> Result<()> {
    let mut w = mem_writer::<Vec<u8>>(16);
    // ids arrive out of order, records of varying length
    let ids: Vec<u64> = (0..500u64).map(|i| (i * 7919) % 1000).collect();
    for &id in &ids {
        w.write(id, &vec![(id % 251) as u8; (id % 23) as usize])?;
    }
    w.save_offsets()?;
    assert_eq!(w.written(), 500);

    let mut r = reader_from(&w);
    r.load_offsets()?;
    assert_eq!(r.len(), 500);
    for &id in &ids {
        let rec = r.read(id)?.expect("written id must be found");
        assert_eq!(rec, vec![(id % 251) as u8; (id % 23) as usize]);
    }
    Ok(())
}

#[test]
fn offset_points_at_record_start() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    let a = w.write(1, &"abc".to_string())?;
    let b = w.write(2, &"defgh".to_string())?;
    assert_eq!(a, 0);
    assert_eq!(b, 4 + 3);
    w.save_offsets()?;

    let offs = w.offsets_storage().as_bytes();
    assert_eq!(&offs[0..8], &1u64.to_le_bytes());
    assert_eq!(&offs[8..16], &a.to_le_bytes());
    assert_eq!(&offs[16..24], &2u64.to_le_bytes());
    assert_eq!(&offs[24..32], &b.to_le_bytes());
    Ok(())
}

#[test]
fn missing_id_is_not_an_error() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    w.write(1, &"one".to_string())?;
    w.save_offsets()?;

    let mut r = reader_from(&w);
    r.load_offsets()?;
    assert!(r.read(2)?.is_none());
    assert!(!r.contains(2));
    assert!(r.contains(1));
    Ok(())
}

// -------------------- Duplicate ids --------------------

#[test]
fn duplicate_ids_enumerate_in_write_order() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    w.write(5, &"rec5".to_string())?;
    w.write(5, &"rec5b".to_string())?;
    w.write(7, &"rec7".to_string())?;
    w.save_offsets()?;

    let mut r = reader_from(&w);
    r.load_offsets_multi()?;

    let mut got = Vec::new();
    let stopped = r.read_all(5, |rec| {
        got.push(rec);
        false
    })?;
    assert!(!stopped);
    assert_eq!(got, vec!["rec5".to_string(), "rec5b".to_string()]);

    assert!(r.read(6)?.is_none());
    assert_eq!(r.read(7)?, Some("rec7".to_string()));
    Ok(())
}

#[test]
fn read_all_stops_when_visitor_says_so() -> Result<()> {
    let mut w = mem_writer::<u64>(1024);
    for v in 0..5u64 {
        w.write(1, &v)?;
    }
    w.save_offsets()?;

    let mut r = reader_from(&w);
    r.load_offsets_multi()?;
    let mut seen = Vec::new();
    assert!(r.read_all(1, |v| {
        seen.push(v);
        v == 2
    })?);
    assert_eq!(seen, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn unique_load_rejects_repeated_ids() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    w.write(5, &"rec5".to_string())?;
    w.write(5, &"rec5b".to_string())?;
    w.save_offsets()?;

    let mut r = reader_from(&w);
    match r.load_offsets() {
        Err(CacheError::Index(IndexError::DuplicateKey { id, .. })) => assert_eq!(id, 5),
        other => panic!("expected DuplicateKey, got {:?}", other),
    }
    Ok(())
}

// -------------------- Lifecycle contract --------------------

#[test]
fn read_before_load_is_rejected() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    w.write(1, &"one".to_string())?;
    w.save_offsets()?;

    let mut r = reader_from(&w);
    assert!(matches!(r.read(1), Err(CacheError::OffsetsNotLoaded(_))));
    assert!(matches!(
        r.read_all(1, |_| false),
        Err(CacheError::OffsetsNotLoaded(_))
    ));
    Ok(())
}

#[test]
fn skipping_save_loses_buffered_offsets() -> Result<()> {
    let mut w = mem_writer::<String>(1024);
    w.write(1, &"one".to_string())?;
    w.write(2, &"two".to_string())?;

    // data reached the stream, offsets are still buffered
    assert!(!w.data_storage().is_empty());
    assert!(w.offsets_storage().is_empty());

    let mut r = reader_from(&w);
    r.load_offsets()?;
    assert!(r.is_empty());
    assert!(r.read(1)?.is_none());

    w.save_offsets()?;
    Ok(())
}

/// Four-byte record that refuses to encode a zero tag.
#[derive(Debug, PartialEq)]
struct Tag(u32);

impl Record for Tag {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.0 == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero tag"));
        }
        w.write_all(&self.0.to_le_bytes())
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut b = [0u8; 4];
        r.read_exact(&mut b)?;
        Ok(Tag(u32::from_le_bytes(b)))
    }
}

#[test]
fn failed_encode_leaves_no_offset_behind() -> Result<()> {
    let mut w = mem_writer::<Tag>(1024);
    assert!(matches!(w.write(1, &Tag(0)), Err(CacheError::Io(_))));
    assert_eq!(w.write(2, &Tag(42))?, 0);
    w.save_offsets()?;
    assert_eq!(w.written(), 1);
    assert_eq!(w.offsets_storage().len(), 16);

    let mut r = reader_from(&w);
    r.load_offsets()?;
    assert!(r.read(1)?.is_none());
    assert_eq!(r.read(2)?, Some(Tag(42)));
    Ok(())
}

// -------------------- File-backed --------------------

#[test]
fn file_store_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("ways.dat");

    {
        let mut w: KeyedWriter<WayRecord> = KeyedWriter::create(&path)?.with_flush_threshold(10);
        for id in 1..=100u64 {
            w.write(id, &WayRecord::new((id..id + id % 5 + 2).collect()))?;
        }
        w.save_offsets()?;
    }
    assert_eq!(std::fs::metadata(dir.path().join("ways.dat.offs"))?.len(), 100 * 16);

    let mut r: KeyedReader<WayRecord> = KeyedReader::open(&path)?;
    r.load_offsets()?;
    for id in (1..=100u64).rev() {
        let way = r.read(id)?.expect("way must be found");
        assert_eq!(way.nodes, (id..id + id % 5 + 2).collect::<Vec<_>>());
    }
    assert!(r.read(101)?.is_none());
    Ok(())
}

#[test]
fn open_without_offset_file_fails() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("relations.dat");
    std::fs::write(&path, b"")?;
    let err = KeyedReader::<RelationRecord>::open(&path).err().expect("must fail");
    assert!(matches!(err, CacheError::Index(IndexError::Io(_))));
    Ok(())
}
