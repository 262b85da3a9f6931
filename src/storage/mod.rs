//! Sample log subsystem for chronoscope
//!
//! The sample log holds the canonical persistent state of all raw samples.
//! It is an append-only file of fixed-size records with no in-place updates.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - Checksum-verified on every read
//! - One fsync per appended batch
//! - Arrival order is preserved on disk; ordering by timestamp happens in memory
//!
//! # Invariants Enforced
//!
//! - Every record carries a CRC32 over its payload
//! - A checksum mismatch or truncated tail halts startup

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::StorageReader;
pub use record::{Sample, RECORD_SIZE};
pub use writer::StorageWriter;

use std::path::{Path, PathBuf};

/// Returns `<data_dir>/data/samples.dat`
pub fn sample_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("data").join("samples.dat")
}
