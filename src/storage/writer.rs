//! Sample log writer with fsync per batch
//!
//! A batch is written as one contiguous append followed by a single fsync.
//! The caller must not acknowledge a batch unless `append_batch` succeeds.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{Sample, RECORD_SIZE};

/// Append-only writer for `samples.dat`.
pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl StorageWriter {
    /// Opens or creates the sample log under the given data directory.
    ///
    /// Creates `<data_dir>/data/samples.dat` and parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::write_failed` if the file cannot be created or opened.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let storage_path = super::sample_log_path(data_dir);
        if let Some(parent) = storage_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::write_failed(
                        format!("Failed to create data directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&storage_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open sample log: {}", storage_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the current end-of-log offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Number of records in the log
    pub fn record_count(&self) -> u64 {
        self.current_offset / RECORD_SIZE as u64
    }

    /// Appends a batch of samples and fsyncs once.
    ///
    /// Returns the byte offset where the batch starts. On failure the file
    /// is truncated back to that offset, so a rejected batch leaves no
    /// partial records behind.
    ///
    /// # Errors
    ///
    /// Returns `CHRONO_STORAGE_WRITE_FAILED` if write or fsync fails.
    pub fn append_batch(&mut self, samples: &[Sample]) -> StorageResult<u64> {
        self.append_with(samples, write_records)
    }

    fn append_with<F>(&mut self, samples: &[Sample], write: F) -> StorageResult<u64>
    where
        F: FnOnce(&mut File, &[Sample]) -> io::Result<()>,
    {
        let offset = self.current_offset;
        if samples.is_empty() {
            return Ok(offset);
        }

        let result = write(&mut self.file, samples)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to append batch of {} samples", samples.len()),
                    e,
                )
            })
            .and_then(|()| {
                self.file.sync_all().map_err(|e| {
                    StorageError::write_failed(
                        format!("fsync failed after appending {} samples", samples.len()),
                        e,
                    )
                })
            });

        if let Err(err) = result {
            return Err(self.roll_back(offset, err));
        }

        self.current_offset += (samples.len() * RECORD_SIZE) as u64;
        Ok(offset)
    }

    /// Cuts the log back to `offset` after a failed append
    fn roll_back(&mut self, offset: u64, err: StorageError) -> StorageError {
        match self.file.set_len(offset).and_then(|()| self.file.sync_all()) {
            Ok(()) => err,
            Err(e) => StorageError::write_failed(
                format!("{}; truncating back to offset {} also failed", err, offset),
                e,
            ),
        }
    }
}

fn write_records(file: &mut File, samples: &[Sample]) -> io::Result<()> {
    let mut out = BufWriter::with_capacity(64 * 1024, file);
    for sample in samples {
        out.write_all(&sample.encode())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageReader;
    use tempfile::TempDir;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("data");
        assert!(!data_path.exists());

        let _writer = StorageWriter::open(temp_dir.path()).unwrap();

        assert!(data_path.join("samples.dat").exists());
    }

    #[test]
    fn test_append_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let batch = vec![Sample::new(0, 10), Sample::new(1_000_000_000, 20)];

        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer.append_batch(&batch).unwrap();
        }

        let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
        assert_eq!(reader.read_all().unwrap(), batch);
    }

    #[test]
    fn test_offset_tracking() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.current_offset(), 0);

        let first = writer.append_batch(&[Sample::new(1, 1)]).unwrap();
        assert_eq!(first, 0);
        let second = writer
            .append_batch(&[Sample::new(2, 2), Sample::new(3, 3)])
            .unwrap();
        assert_eq!(second, RECORD_SIZE as u64);
        assert_eq!(writer.record_count(), 3);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&[]).unwrap();
        assert_eq!(writer.current_offset(), 0);
    }

    #[test]
    fn test_reopen_continues_at_end() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer.append_batch(&[Sample::new(5, 50)]).unwrap();
        }

        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.record_count(), 1);
        writer.append_batch(&[Sample::new(6, 60)]).unwrap();
        assert_eq!(writer.record_count(), 2);
    }

    #[test]
    fn test_failed_append_leaves_no_partial_records() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer.append_batch(&[Sample::new(1, 1), Sample::new(2, 2)]).unwrap();
        let committed = writer.current_offset();

        let batch: Vec<Sample> = (10..20).map(|i| Sample::new(i, i)).collect();
        let result = writer.append_with(&batch, |file, samples| {
            // Three whole records and part of a fourth reach the file
            for sample in &samples[..3] {
                file.write_all(&sample.encode())?;
            }
            file.write_all(&samples[3].encode()[..7])?;
            Err(io::Error::new(io::ErrorKind::Other, "No space left on device"))
        });

        let err = result.unwrap_err();
        assert_eq!(err.code(), crate::storage::StorageErrorCode::WriteFailed);
        assert_eq!(writer.current_offset(), committed);
        let len = fs::metadata(writer.path()).unwrap().len();
        assert_eq!(len, committed);

        writer.append_batch(&[Sample::new(3, 3)]).unwrap();
        drop(writer);

        let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
        assert_eq!(
            reader.read_all().unwrap(),
            vec![Sample::new(1, 1), Sample::new(2, 2), Sample::new(3, 3)]
        );
    }
}
