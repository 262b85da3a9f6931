//! Aggregation engine for chronoscope
//!
//! Holds the raw samples, builds one aggregate table per non-finest level
//! and answers range queries at any level.
//!
//! # Invariants
//!
//! - Finest-level queries return stored integer values unchanged
//! - Aggregated points carry floating means keyed by bucket start
//! - Precomputed and on-the-fly reads of the same range agree
//! - Readers only ever see whole published snapshots

mod bucket;
mod engine;
mod errors;
mod point;
mod query;
mod runs;
mod snapshot;

pub use bucket::{bucket_start, bucketize, AggregateBucket, BucketAccumulator};
pub use engine::{Engine, QueryResult, RebuildSummary};
pub use errors::{EngineError, EngineResult};
pub use point::{Point, PointValue};
pub use query::{aggregate_on_the_fly, aggregate_precomputed, raw_range, scan_raw, QueryPath};
pub use runs::SampleRuns;
pub use snapshot::{AggregateSet, Snapshot, Stats};
