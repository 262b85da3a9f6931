//! Sample log durability tests
//!
//! Every acknowledged batch is on disk. Any checksum mismatch or torn
//! record refuses startup instead of serving a partial dataset.

use std::fs::{self, OpenOptions};
use std::io::Write;

use chronoscope::engine::Engine;
use chronoscope::storage::{
    sample_log_path, Sample, StorageErrorCode, StorageReader, StorageWriter, RECORD_SIZE,
};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn samples(n: i64) -> Vec<Sample> {
    (0..n).map(|i| Sample::new(i * 10, i)).collect()
}

// =============================================================================
// Reopen
// =============================================================================

#[test]
fn test_reopen_restores_every_sample() {
    let temp_dir = create_temp_data_dir();

    {
        let engine = Engine::open(temp_dir.path()).unwrap();
        engine.ingest(samples(5)).unwrap();
        engine.ingest(vec![Sample::new(-7, 99)]).unwrap();
    }

    let engine = Engine::open(temp_dir.path()).unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.raw().len(), 6);
    assert_eq!(snapshot.raw().all()[0], Sample::new(-7, 99));
    assert!(snapshot.aggregates_current());
}

#[test]
fn test_log_keeps_arrival_order() {
    let temp_dir = create_temp_data_dir();

    {
        let engine = Engine::open(temp_dir.path()).unwrap();
        engine.ingest(vec![Sample::new(50, 1)]).unwrap();
        engine.ingest(vec![Sample::new(10, 2)]).unwrap();
    }

    let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
    let on_disk = reader.read_all().unwrap();
    assert_eq!(on_disk, vec![Sample::new(50, 1), Sample::new(10, 2)]);
}

#[test]
fn test_log_size_is_whole_records() {
    let temp_dir = create_temp_data_dir();
    {
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&samples(4)).unwrap();
        writer.append_batch(&samples(3)).unwrap();
    }

    let len = fs::metadata(sample_log_path(temp_dir.path())).unwrap().len();
    assert_eq!(len, 7 * RECORD_SIZE as u64);
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_flipped_byte_refuses_open() {
    let temp_dir = create_temp_data_dir();
    {
        let engine = Engine::open(temp_dir.path()).unwrap();
        engine.ingest(samples(3)).unwrap();
    }

    let path = sample_log_path(temp_dir.path());
    let mut contents = fs::read(&path).unwrap();
    contents[RECORD_SIZE + 3] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = Engine::open(temp_dir.path()).err().unwrap();
    assert_eq!(err.code(), StorageErrorCode::DataCorruption.code());
    assert!(!err.is_validation());
}

#[test]
fn test_torn_tail_refuses_open() {
    let temp_dir = create_temp_data_dir();
    {
        let engine = Engine::open(temp_dir.path()).unwrap();
        engine.ingest(samples(2)).unwrap();
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(sample_log_path(temp_dir.path()))
        .unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
    assert_eq!(reader.read_next().unwrap(), Some(Sample::new(0, 0)));
    assert_eq!(reader.read_next().unwrap(), Some(Sample::new(10, 1)));
    let err = reader.read_next().unwrap_err();
    assert!(err.is_fatal());

    assert!(Engine::open(temp_dir.path()).is_err());
}
