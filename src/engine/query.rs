//! Range reads over a snapshot
//!
//! A range `[start_ns, end_ns]` is inclusive on both ends. Samples outside
//! it are filtered out before bucketing, so the first and last bucket of an
//! aggregated result may be averaged over part of their width.
//!
//! Two paths produce the same points:
//!
//! - on the fly: bucket the in-range raw samples directly
//! - precomputed: read buckets fully inside the range from the aggregate
//!   table and compute at most two partial edge buckets from raw

use serde::Serialize;

use super::bucket::{bucketize, AggregateBucket};
use super::point::Point;
use super::snapshot::Snapshot;
use crate::granularity::Granularity;
use crate::storage::Sample;

/// How an aggregated query is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPath {
    OnTheFly,
    Precomputed,
}

/// Samples with `start_ns <= timestamp_ns <= end_ns`
pub fn raw_range(raw: &[Sample], start_ns: i64, end_ns: i64) -> &[Sample] {
    if start_ns > end_ns {
        return &[];
    }
    let lo = raw.partition_point(|s| s.timestamp_ns < start_ns);
    let hi = raw.partition_point(|s| s.timestamp_ns <= end_ns);
    &raw[lo..hi]
}

/// Finest-level read: stored samples, untouched
pub fn scan_raw(raw: &[Sample], start_ns: i64, end_ns: i64) -> Vec<Point> {
    raw_range(raw, start_ns, end_ns)
        .iter()
        .map(Point::from)
        .collect()
}

fn to_points(buckets: Vec<AggregateBucket>) -> impl Iterator<Item = Point> {
    buckets
        .into_iter()
        .map(|b| Point::mean(b.bucket_start_ns, b.mean_value))
}

pub fn aggregate_on_the_fly(raw: &[Sample], start_ns: i64, end_ns: i64, ns_size: i64) -> Vec<Point> {
    to_points(bucketize(raw_range(raw, start_ns, end_ns), ns_size)).collect()
}

pub fn aggregate_precomputed(
    raw: &[Sample],
    table: &[AggregateBucket],
    start_ns: i64,
    end_ns: i64,
    ns_size: i64,
) -> Vec<Point> {
    if start_ns > end_ns {
        return Vec::new();
    }

    // Bounds are computed unclamped in i128 so they cannot overflow near
    // either end of the timestamp domain.
    let ns = ns_size as i128;
    let start = start_ns as i128;
    let end = end_ns as i128;

    let start_floor = start.div_euclid(ns) * ns;
    let first_full = if start_floor == start {
        start_floor
    } else {
        start_floor + ns
    };
    let end_floor = end.div_euclid(ns) * ns;
    let last_full = if end_floor + ns - 1 <= end {
        end_floor
    } else {
        end_floor - ns
    };

    if first_full > last_full {
        return aggregate_on_the_fly(raw, start_ns, end_ns, ns_size);
    }

    // first_full and last_full now lie within [start, end]
    let first_full = first_full as i64;
    let last_full = last_full as i64;

    let mut points = Vec::new();

    if first_full > start_ns {
        points.extend(aggregate_on_the_fly(raw, start_ns, first_full - 1, ns_size));
    }

    let lo = table.partition_point(|b| b.bucket_start_ns < first_full);
    let hi = table.partition_point(|b| b.bucket_start_ns <= last_full);
    points.extend(
        table[lo..hi]
            .iter()
            .map(|b| Point::mean(b.bucket_start_ns, b.mean_value)),
    );

    let tail_start = last_full as i128 + ns;
    if tail_start <= end {
        points.extend(aggregate_on_the_fly(raw, tail_start as i64, end_ns, ns_size));
    }

    points
}

/// Answers a range read at `granularity` from `snapshot`.
///
/// The finest level always reads raw samples. Coarser levels use the
/// requested path; a precomputed read against a snapshot without a table
/// for the level falls back to on the fly.
pub fn execute(
    snapshot: &Snapshot,
    granularity: &Granularity,
    start_ns: i64,
    end_ns: i64,
    path: QueryPath,
) -> Vec<Point> {
    let raw = snapshot.raw().range(start_ns, end_ns);
    if granularity.is_finest() {
        return scan_raw(&raw, start_ns, end_ns);
    }

    match (path, snapshot.aggregates().table(granularity)) {
        (QueryPath::Precomputed, Some(table)) => {
            aggregate_precomputed(&raw, table, start_ns, end_ns, granularity.ns_size)
        }
        _ => aggregate_on_the_fly(&raw, start_ns, end_ns, granularity.ns_size),
    }
}
