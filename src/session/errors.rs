//! # Session Errors
//!
//! Every variant is reported to the client as `{error, code}` and leaves the
//! session exactly as it was.

use thiserror::Error;

use crate::granularity::GranularityError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Navigation session errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    // ==================
    // Protocol Errors
    // ==================
    /// Message was not valid JSON or lacked `action`
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Action name not recognized
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// Action needs a field the message did not carry
    #[error("Action '{action}' requires field '{field}'")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    // ==================
    // Navigation Errors
    // ==================
    #[error(transparent)]
    UnknownGranularity(#[from] GranularityError),

    /// Pan amount was zero or negative
    #[error("Pan amount must be positive (got {0})")]
    NonPositivePan(i64),

    /// Action needs a window but nothing has been loaded yet
    #[error("No window loaded; send 'load' first")]
    NoWindow,

    /// `load` with start after end
    #[error("Window start {start_ns} is after end {end_ns}")]
    InvalidWindow { start_ns: i64, end_ns: i64 },

    /// Pan would move the window outside the timestamp domain
    #[error("Panning by {amount_ns} ns would overflow the window")]
    WindowOverflow { amount_ns: i64 },

    /// Already at the coarsest level
    #[error("Already at the coarsest granularity '{0}'")]
    AtCoarsest(&'static str),

    /// Already at the finest level
    #[error("Already at the finest granularity '{0}'")]
    AtFinest(&'static str),
}

impl SessionError {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidMessage(_) => "CHRONO_SESSION_INVALID_MESSAGE",
            SessionError::UnknownAction(_) => "CHRONO_SESSION_UNKNOWN_ACTION",
            SessionError::MissingField { .. } => "CHRONO_SESSION_MISSING_FIELD",
            SessionError::UnknownGranularity(e) => e.code(),
            SessionError::NonPositivePan(_) => "CHRONO_SESSION_NON_POSITIVE_PAN",
            SessionError::NoWindow => "CHRONO_SESSION_NO_WINDOW",
            SessionError::InvalidWindow { .. } => "CHRONO_SESSION_INVALID_WINDOW",
            SessionError::WindowOverflow { .. } => "CHRONO_SESSION_WINDOW_OVERFLOW",
            SessionError::AtCoarsest(_) => "CHRONO_SESSION_AT_COARSEST",
            SessionError::AtFinest(_) => "CHRONO_SESSION_AT_FINEST",
        }
    }

    /// All session errors are caller errors
    pub fn is_validation(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SessionError::UnknownAction("zoom".into()).code(),
            "CHRONO_SESSION_UNKNOWN_ACTION"
        );
        assert_eq!(SessionError::NoWindow.code(), "CHRONO_SESSION_NO_WINDOW");
        assert_eq!(SessionError::AtFinest("1t").code(), "CHRONO_SESSION_AT_FINEST");
    }

    #[test]
    fn test_unknown_action_names_the_action() {
        let err = SessionError::UnknownAction("zoom".into());
        assert!(err.to_string().contains("'zoom'"));
    }
}
