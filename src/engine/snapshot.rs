//! Immutable published views of the store
//!
//! A `Snapshot` is never mutated after publication. Ingest and rebuild
//! derive a successor and swap it in whole, so a reader holding a snapshot
//! sees either the state before a change or after it.

use std::sync::Arc;

use serde::Serialize;

use super::bucket::{bucketize, AggregateBucket};
use super::runs::SampleRuns;
use crate::granularity::{Granularity, GranularityRegistry};
use crate::storage::Sample;

/// Summary of the raw samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub count: u64,
    pub min_timestamp_ns: Option<i64>,
    pub max_timestamp_ns: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

fn fold_min(current: Option<i64>, candidate: i64) -> Option<i64> {
    Some(current.map_or(candidate, |c| c.min(candidate)))
}

fn fold_max(current: Option<i64>, candidate: i64) -> Option<i64> {
    Some(current.map_or(candidate, |c| c.max(candidate)))
}

impl Stats {
    /// Stats of `self` plus every sample in `batch`
    pub fn extend(&self, batch: &[Sample]) -> Stats {
        let mut next = *self;
        for sample in batch {
            next.count += 1;
            next.min_timestamp_ns = fold_min(next.min_timestamp_ns, sample.timestamp_ns);
            next.max_timestamp_ns = fold_max(next.max_timestamp_ns, sample.timestamp_ns);
            next.min_value = fold_min(next.min_value, sample.value);
            next.max_value = fold_max(next.max_value, sample.value);
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Precomputed tables for every non-finest level
#[derive(Debug, Default)]
pub struct AggregateSet {
    /// Raw generation the tables were built from; `None` until first build
    source_generation: Option<u64>,
    /// Indexed by `GranularityId::index()`; the finest entry stays empty
    tables: Vec<Vec<AggregateBucket>>,
}

impl AggregateSet {
    /// Builds every non-finest table from timestamp-sorted samples
    pub fn build(registry: &GranularityRegistry, raw: &[Sample], generation: u64) -> Self {
        let tables = registry
            .iter()
            .map(|g| {
                if g.is_finest() {
                    Vec::new()
                } else {
                    bucketize(raw, g.ns_size)
                }
            })
            .collect();

        Self {
            source_generation: Some(generation),
            tables,
        }
    }

    pub fn source_generation(&self) -> Option<u64> {
        self.source_generation
    }

    /// Table for `granularity`, or `None` for the finest level or before a build
    pub fn table(&self, granularity: &Granularity) -> Option<&[AggregateBucket]> {
        if granularity.is_finest() {
            return None;
        }
        self.tables
            .get(granularity.id.index())
            .map(|t| t.as_slice())
    }

    /// Total rows across all tables
    pub fn bucket_count(&self) -> usize {
        self.tables.iter().map(Vec::len).sum()
    }
}

/// A consistent view of raw samples, their stats and the aggregate tables
#[derive(Debug, Default)]
pub struct Snapshot {
    version: u64,
    raw: SampleRuns,
    raw_generation: u64,
    stats: Stats,
    aggregates: Arc<AggregateSet>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Successor with new raw samples; aggregates carry over and go stale
    pub fn with_raw(&self, raw: SampleRuns, stats: Stats) -> Self {
        Self {
            version: self.version + 1,
            raw,
            raw_generation: self.raw_generation + 1,
            stats,
            aggregates: Arc::clone(&self.aggregates),
        }
    }

    /// Successor with freshly built aggregates.
    ///
    /// `raw` must hold the same samples as `self.raw()`, possibly laid out
    /// in fewer runs; the raw generation does not change.
    pub fn with_aggregates(&self, raw: SampleRuns, aggregates: AggregateSet) -> Self {
        debug_assert_eq!(raw.len(), self.raw.len());
        Self {
            version: self.version + 1,
            raw,
            raw_generation: self.raw_generation,
            stats: self.stats,
            aggregates: Arc::new(aggregates),
        }
    }

    /// Monotonic publication counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raw samples sorted by timestamp; equal timestamps keep arrival order
    pub fn raw(&self) -> &SampleRuns {
        &self.raw
    }

    pub fn raw_generation(&self) -> u64 {
        self.raw_generation
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn aggregates(&self) -> &AggregateSet {
        &self.aggregates
    }

    /// Whether the aggregate tables reflect every raw sample
    pub fn aggregates_current(&self) -> bool {
        self.aggregates.source_generation == Some(self.raw_generation)
    }
}
