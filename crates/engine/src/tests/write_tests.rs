use super::helpers::{count_segment_files, quiet_config};
use crate::{Engine, KvsError};
use anyhow::Result;
use tempfile::tempdir;

// --------------------- Basic write / read / delete ---------------------

#[test]
fn write_then_read_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    engine.write(b"key", b"{ \"key\": \"value\" }")?;
    assert_eq!(engine.read(b"key")?, b"{ \"key\": \"value\" }");
    Ok(())
}

#[test]
fn last_write_wins() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    engine.write(b"key", b"v1")?;
    engine.write(b"key", b"v2")?;
    assert_eq!(engine.read(b"key")?, b"v2");
    Ok(())
}

#[test]
fn delete_then_read_fails() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    engine.write(b"key", b"v")?;
    engine.delete(b"key")?;
    assert!(matches!(engine.read(b"key"), Err(KvsError::EntryNotFound)));
    Ok(())
}

#[test]
fn delete_of_absent_key_fails() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    assert!(matches!(
        engine.delete(b"never-written"),
        Err(KvsError::EntryNotFound)
    ));
    Ok(())
}

#[test]
fn write_after_delete_resurrects() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    engine.write(b"key", b"v1")?;
    engine.delete(b"key")?;
    engine.write(b"key", b"v2")?;
    assert_eq!(engine.read(b"key")?, b"v2");
    Ok(())
}

#[test]
fn empty_value_roundtrips() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    engine.write(b"key", b"")?;
    assert_eq!(engine.read(b"key")?, b"");
    Ok(())
}

#[test]
fn binary_keys_and_values_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    let key = [0u8, 255, 1, 254, 10, 13];
    let value: Vec<u8> = (0..=255).collect();
    engine.write(&key, &value)?;
    assert_eq!(engine.read(&key)?, value);
    Ok(())
}

#[test]
fn many_keys_all_readable() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(quiet_config(&dir.path().join("t")))?;

    for i in 0..200u32 {
        engine.write(format!("key{:03}", i).as_bytes(), format!("value{}", i).as_bytes())?;
    }
    assert_eq!(engine.key_count(), 200);
    for i in 0..200u32 {
        assert_eq!(
            engine.read(format!("key{:03}", i).as_bytes())?,
            format!("value{}", i).into_bytes()
        );
    }
    Ok(())
}

// --------------------- Rollover ---------------------

#[test]
fn rollover_after_threshold_crossings() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("t");
    // Each record is 9 + 4 + 3 + 4 + 9 = 29 bytes, so every third write
    // crosses the 64-byte threshold.
    let engine = Engine::open(quiet_config(&db).log_file_size_threshold(64))?;

    for i in 0..10u32 {
        engine.write(format!("k_{}", i).as_bytes(), format!("payload_{}", i).as_bytes())?;
    }

    assert!(
        count_segment_files(&db) >= 4,
        "expected at least 4 segments, got {}",
        count_segment_files(&db)
    );
    for i in 0..10u32 {
        assert_eq!(
            engine.read(format!("k_{}", i).as_bytes())?,
            format!("payload_{}", i).into_bytes()
        );
    }
    Ok(())
}

#[test]
fn overwrite_across_segments_reads_newest() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("t");
    let engine = Engine::open(quiet_config(&db).log_file_size_threshold(64))?;

    engine.write(b"key", b"old-value")?;
    // Push the head over the threshold so the next write lands in a fresh
    // segment while the stale record stays behind.
    for i in 0..4u32 {
        engine.write(format!("filler{}", i).as_bytes(), b"xxxxxxxxxxxxxxxx")?;
    }
    engine.write(b"key", b"new-value")?;

    assert!(count_segment_files(&db) >= 2);
    assert_eq!(engine.read(b"key")?, b"new-value");
    Ok(())
}

#[test]
fn delete_works_across_segments() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("t");
    let engine = Engine::open(quiet_config(&db).log_file_size_threshold(64))?;

    engine.write(b"key", b"value")?;
    for i in 0..4u32 {
        engine.write(format!("filler{}", i).as_bytes(), b"xxxxxxxxxxxxxxxx")?;
    }
    assert!(count_segment_files(&db) >= 2);

    // The tombstone lands in the current head, not the segment that owns the
    // live record.
    engine.delete(b"key")?;
    assert!(matches!(engine.read(b"key"), Err(KvsError::EntryNotFound)));
    Ok(())
}

#[test]
fn deletes_count_toward_the_rollover_threshold() -> Result<()> {
    let dir = tempdir()?;
    let db = dir.path().join("t");
    let engine = Engine::open(quiet_config(&db).log_file_size_threshold(64))?;

    // Tombstones are records too: 9 + 4 + 5 + 4 = 22 bytes each.
    for i in 0..9u32 {
        engine.write(format!("key_{}", i).as_bytes(), b"")?;
        engine.delete(format!("key_{}", i).as_bytes())?;
    }

    assert!(count_segment_files(&db) >= 2);
    assert_eq!(engine.key_count(), 0);
    Ok(())
}
