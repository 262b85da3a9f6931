//! Aggregation engine errors

use thiserror::Error;

use crate::granularity::GranularityError;
use crate::storage::StorageError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Query named a symbol outside the chain
    #[error(transparent)]
    UnknownGranularity(#[from] GranularityError),

    /// A precomputed read was forced but the tables are missing or stale
    #[error("Aggregates for '{granularity}' do not reflect the current samples")]
    AggregatesUnavailable { granularity: String },

    /// Sample log could not be read or written
    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnknownGranularity(e) => e.code(),
            EngineError::AggregatesUnavailable { .. } => "CHRONO_AGGREGATES_UNAVAILABLE",
            EngineError::Storage(e) => e.code().code(),
        }
    }

    /// Whether the caller sent something invalid, as opposed to a server fault
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::UnknownGranularity(_))
    }
}
