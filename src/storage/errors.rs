//! Storage error types
//!
//! Error codes:
//! - CHRONO_STORAGE_IO_ERROR (ERROR severity)
//! - CHRONO_STORAGE_WRITE_FAILED (ERROR severity)
//! - CHRONO_STORAGE_READ_FAILED (ERROR severity)
//! - CHRONO_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, server continues
    Error,
    /// chronoscope must refuse to serve
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    IoError,
    /// Sample batch append failed
    WriteFailed,
    /// Sample read failed
    ReadFailed,
    /// Checksum failure or truncated record
    DataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IoError => "CHRONO_STORAGE_IO_ERROR",
            StorageErrorCode::WriteFailed => "CHRONO_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "CHRONO_STORAGE_READ_FAILED",
            StorageErrorCode::DataCorruption => "CHRONO_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::WriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::ReadFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error must stop the process from serving
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageErrorCode::IoError.code(), "CHRONO_STORAGE_IO_ERROR");
        assert_eq!(StorageErrorCode::WriteFailed.code(), "CHRONO_STORAGE_WRITE_FAILED");
        assert_eq!(StorageErrorCode::ReadFailed.code(), "CHRONO_STORAGE_READ_FAILED");
        assert_eq!(StorageErrorCode::DataCorruption.code(), "CHRONO_DATA_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        let err = StorageError::corruption_at_offset(40, "checksum mismatch");
        assert!(err.is_fatal());

        let err = StorageError::write_failed("disk full", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_display_contains_offset() {
        let err = StorageError::corruption_at_offset(1024, "checksum mismatch");
        let display = err.to_string();
        assert!(display.contains("FATAL"));
        assert!(display.contains("CHRONO_DATA_CORRUPTION"));
        assert!(display.contains("byte_offset: 1024"));
    }
}
