//! Granularity lookup errors

use thiserror::Error;

/// Result type for granularity lookups
pub type GranularityResult<T> = Result<T, GranularityError>;

/// Granularity errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GranularityError {
    /// Symbol is not part of the chain
    #[error("Invalid granularity '{symbol}'. Valid options are: {}", .valid.join(", "))]
    NotFound {
        symbol: String,
        valid: Vec<&'static str>,
    },
}

impl GranularityError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            GranularityError::NotFound { .. } => "CHRONO_UNKNOWN_GRANULARITY",
        }
    }
}
