//! Observability subsystem for chronoscope
//!
//! This module provides:
//! - Structured logging (JSON lines)
//! - Monotonic counters
//! - Lifecycle event tracing
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//! 4. Observability failure never fails an operation
//!
//! # Usage
//!
//! ```ignore
//! use chronoscope::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::QueryExecuted, &[("granularity", "1s")]);
//!
//! let scope = ObservationScope::new("REBUILD");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    match severity_for(event) {
        Severity::Fatal => Logger::fatal(event.as_str(), fields),
        severity => Logger::log(severity, event.as_str(), fields),
    }
}

/// Log a warning-level event with fields
pub fn warn_event(event: Event, fields: &[(&str, &str)]) {
    Logger::warn(event.as_str(), fields);
}
