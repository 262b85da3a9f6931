//! Bucketing arithmetic shared by the precomputed and on-the-fly paths
//!
//! Both paths reduce a run of samples through `BucketAccumulator`, which sums
//! in `i128` and divides once. This makes their means bit-identical; the
//! documented tolerance (relative error <= 1e-9) is therefore never reached.

use serde::Serialize;

use crate::storage::Sample;

/// Start of the bucket of width `ns_size` containing `timestamp_ns`.
///
/// Uses floor division, so negative timestamps land in the bucket below
/// zero rather than being truncated towards it. Results that would fall
/// below `i64::MIN` are clamped to it.
pub fn bucket_start(timestamp_ns: i64, ns_size: i64) -> i64 {
    if ns_size <= 1 {
        return timestamp_ns;
    }
    let ns = ns_size as i128;
    let floored = (timestamp_ns as i128).div_euclid(ns) * ns;
    floored.max(i64::MIN as i128) as i64
}

/// One precomputed row of an aggregate table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub bucket_start_ns: i64,
    pub mean_value: f64,
    pub sample_count: u64,
}

/// Running sum for one bucket
#[derive(Debug, Clone, Copy)]
pub struct BucketAccumulator {
    start: i64,
    sum: i128,
    count: u64,
}

impl BucketAccumulator {
    pub fn new(start: i64) -> Self {
        Self {
            start,
            sum: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, value: i64) {
        self.sum += value as i128;
        self.count += 1;
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }

    pub fn finish(self) -> AggregateBucket {
        AggregateBucket {
            bucket_start_ns: self.start,
            mean_value: self.mean(),
            sample_count: self.count,
        }
    }
}

/// Groups timestamp-sorted samples into buckets of width `ns_size`.
///
/// Output is ordered by bucket start and holds only occupied buckets.
pub fn bucketize(samples: &[Sample], ns_size: i64) -> Vec<AggregateBucket> {
    let mut buckets = Vec::new();
    let mut current: Option<BucketAccumulator> = None;

    for sample in samples {
        let start = bucket_start(sample.timestamp_ns, ns_size);
        match current.as_mut() {
            Some(acc) if acc.start() == start => acc.push(sample.value),
            _ => {
                if let Some(done) = current.take() {
                    buckets.push(done.finish());
                }
                let mut acc = BucketAccumulator::new(start);
                acc.push(sample.value);
                current = Some(acc);
            }
        }
    }

    if let Some(done) = current {
        buckets.push(done.finish());
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_start_positive() {
        assert_eq!(bucket_start(0, 1_000), 0);
        assert_eq!(bucket_start(999, 1_000), 0);
        assert_eq!(bucket_start(1_000, 1_000), 1_000);
        assert_eq!(bucket_start(2_500, 1_000), 2_000);
    }

    #[test]
    fn test_bucket_start_negative_floors() {
        assert_eq!(bucket_start(-1, 1_000), -1_000);
        assert_eq!(bucket_start(-1_000, 1_000), -1_000);
        assert_eq!(bucket_start(-1_001, 1_000), -2_000);
    }

    #[test]
    fn test_bucket_start_tick_is_identity() {
        assert_eq!(bucket_start(12345, 1), 12345);
        assert_eq!(bucket_start(i64::MIN, 1), i64::MIN);
    }

    #[test]
    fn test_bucket_start_clamps_at_min() {
        assert_eq!(bucket_start(i64::MIN, 3), i64::MIN);
        assert_eq!(bucket_start(i64::MIN + 1, 7), i64::MIN);
    }

    #[test]
    fn test_accumulator_mean_is_floating() {
        let mut acc = BucketAccumulator::new(0);
        acc.push(1);
        acc.push(2);
        assert_eq!(acc.mean(), 1.5);
    }

    #[test]
    fn test_accumulator_does_not_overflow() {
        let mut acc = BucketAccumulator::new(0);
        acc.push(i64::MAX);
        acc.push(i64::MAX);
        assert_eq!(acc.mean(), i64::MAX as f64);
    }

    #[test]
    fn test_bucketize_groups_contiguous_runs() {
        let samples = [
            Sample::new(0, 10),
            Sample::new(400, 20),
            Sample::new(1_000, 30),
            Sample::new(3_100, 40),
            Sample::new(3_900, 60),
        ];
        let buckets = bucketize(&samples, 1_000);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].bucket_start_ns, 0);
        assert_eq!(buckets[0].mean_value, 15.0);
        assert_eq!(buckets[0].sample_count, 2);
        assert_eq!(buckets[1].bucket_start_ns, 1_000);
        assert_eq!(buckets[2].bucket_start_ns, 3_000);
        assert_eq!(buckets[2].mean_value, 50.0);
    }

    #[test]
    fn test_bucketize_empty() {
        assert!(bucketize(&[], 1_000).is_empty());
    }
}
