//! Metrics registry for chronoscope
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; exactness across counters is not required

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters, shared by the engine and every session
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    samples_ingested: AtomicU64,
    records_skipped: AtomicU64,
    ingest_batches: AtomicU64,
    rebuilds: AtomicU64,
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
    chunks_sent: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_samples_ingested(&self, count: u64) {
        self.samples_ingested.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_records_skipped(&self, count: u64) {
        self.records_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_ingest_batches(&self) {
        self.ingest_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rebuilds(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sessions_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_sessions_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_chunks_sent(&self, count: u64) {
        self.chunks_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Sessions currently open
    pub fn active_sessions(&self) -> u64 {
        let opened = self.sessions_opened.load(Ordering::Relaxed);
        opened.saturating_sub(self.sessions_closed.load(Ordering::Relaxed))
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            ingest_batches: self.ingest_batches.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub samples_ingested: u64,
    pub records_skipped: u64,
    pub ingest_batches: u64,
    pub rebuilds: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub chunks_sent: u64,
}
