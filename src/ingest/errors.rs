//! Bulk ingest errors
//!
//! Malformed records are not errors; they are skipped and counted in the
//! `IngestReport`. These variants abort a load.

use std::io;

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for bulk loads
pub type IngestResult<T> = Result<T, IngestError>;

/// Bulk ingest errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload did not name a `.csv` file
    #[error("Only CSV files are supported (got '{filename}')")]
    NotCsv { filename: String },

    /// Input stream could not be read
    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    /// Engine refused a batch
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl IngestError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::NotCsv { .. } => "CHRONO_INGEST_NOT_CSV",
            IngestError::Io(_) => "CHRONO_INGEST_IO_ERROR",
            IngestError::Engine(e) => e.code(),
        }
    }

    /// Whether the caller sent something invalid, as opposed to a server fault
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::NotCsv { .. })
    }
}
