//! Observable events for chronoscope
//!
//! Events are explicit and typed. Their string form is what appears in the
//! `event` key of a log line.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    BootStart,
    BootComplete,
    ConfigLoaded,
    /// Sample log opened and replayed into memory
    StorageOpened,
    /// Sample log failed verification (FATAL)
    StorageCorruption,
    /// HTTP server accepting connections
    Serving,

    // Ingest
    IngestBatch,
    IngestComplete,
    /// Header line missing from a bulk load
    IngestHeaderMissing,

    // Query
    QueryExecuted,
    QueryRejected,

    // Sessions
    SessionOpened,
    SessionActionRejected,
    SessionClosed,
    SessionTransportError,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "CHRONOSCOPE_STARTUP_BEGIN",
            Event::BootComplete => "CHRONOSCOPE_STARTUP_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StorageOpened => "SAMPLE_LOG_OPENED",
            Event::StorageCorruption => "SAMPLE_LOG_CORRUPTION",
            Event::Serving => "CHRONOSCOPE_SERVING",

            Event::IngestBatch => "INGEST_BATCH",
            Event::IngestComplete => "INGEST_COMPLETE",
            Event::IngestHeaderMissing => "INGEST_HEADER_MISSING",

            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",

            Event::SessionOpened => "SESSION_OPENED",
            Event::SessionActionRejected => "SESSION_ACTION_REJECTED",
            Event::SessionClosed => "SESSION_CLOSED",
            Event::SessionTransportError => "SESSION_TRANSPORT_ERROR",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StorageCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
