//! Sample log reader with strict corruption detection
//!
//! - Every read validates the record checksum
//! - A truncated tail is corruption, not end-of-file
//! - During boot, any corruption aborts startup

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{Sample, RECORD_SIZE};

/// Sequential reader over `samples.dat`.
pub struct StorageReader {
    storage_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens the sample log for reading.
    pub fn open(storage_path: &Path) -> StorageResult<Self> {
        let file = File::open(storage_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open sample log: {}", storage_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path: storage_path.to_path_buf(),
            reader: BufReader::with_capacity(64 * 1024, file),
            current_offset: 0,
            file_size,
        })
    }

    /// Opens the sample log from a data directory.
    pub fn open_from_data_dir(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&super::sample_log_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Number of complete records the file claims to hold
    pub fn record_count(&self) -> u64 {
        self.file_size / RECORD_SIZE as u64
    }

    /// Reads the next sample.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(sample))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(CHRONO_DATA_CORRUPTION)` on checksum failure or truncated tail
    pub fn read_next(&mut self) -> StorageResult<Option<Sample>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated sample log: {} bytes remaining, record size is {}",
                    remaining, RECORD_SIZE
                ),
            ));
        }

        let mut buf = [0u8; RECORD_SIZE];
        self.reader.read_exact(&mut buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read sample record: {}", e),
            )
        })?;

        let sample = Sample::decode(&buf).ok_or_else(|| {
            StorageError::corruption_at_offset(self.current_offset, "Sample checksum mismatch")
        })?;

        self.current_offset += RECORD_SIZE as u64;
        Ok(Some(sample))
    }

    /// Reads every remaining sample in file order.
    pub fn read_all(&mut self) -> StorageResult<Vec<Sample>> {
        let mut samples = Vec::with_capacity(self.record_count() as usize);
        while let Some(sample) = self.read_next()? {
            samples.push(sample);
        }
        Ok(samples)
    }
}
