//! Raw samples held as a stack of sorted runs
//!
//! Ingest pushes each batch as a new run on top and merges it downward
//! while the run below is at most twice its length. Run lengths therefore
//! at least double from top to bottom, the run count stays logarithmic in
//! the sample count, and each sample is copied O(log n) times over any
//! sequence of batches. Rebuild compacts the stack into one run.
//!
//! Older runs lie below newer ones. Merges put the older sample first on
//! equal timestamps, so arrival order survives for ties.

use std::borrow::Cow;
use std::sync::Arc;

use super::query::raw_range;
use crate::storage::Sample;

/// Immutable, cheaply cloned set of timestamp-sorted samples
#[derive(Debug, Clone, Default)]
pub struct SampleRuns {
    /// Oldest run first
    runs: Vec<Arc<[Sample]>>,
    len: usize,
}

/// Stable two-way merge; `older` wins ties
fn merge_two(older: &[Sample], newer: &[Sample]) -> Vec<Sample> {
    let mut merged = Vec::with_capacity(older.len() + newer.len());
    let (mut i, mut j) = (0, 0);
    while i < older.len() && j < newer.len() {
        if newer[j].timestamp_ns < older[i].timestamp_ns {
            merged.push(newer[j]);
            j += 1;
        } else {
            merged.push(older[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&older[i..]);
    merged.extend_from_slice(&newer[j..]);
    merged
}

impl SampleRuns {
    /// Wraps samples already sorted by timestamp
    pub fn from_sorted(samples: Vec<Sample>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let len = samples.len();
        Self {
            runs: vec![Arc::from(samples)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Successor that also holds `batch`; `self` is left untouched
    pub fn push(&self, mut batch: Vec<Sample>) -> SampleRuns {
        if batch.is_empty() {
            return self.clone();
        }
        batch.sort_by_key(|s| s.timestamp_ns);

        let len = self.len + batch.len();
        let mut runs = self.runs.clone();
        let mut top: Arc<[Sample]> = Arc::from(batch);
        while runs
            .last()
            .is_some_and(|below| below.len() / 2 <= top.len())
        {
            if let Some(below) = runs.pop() {
                top = Arc::from(merge_two(&below, &top));
            }
        }
        runs.push(top);

        Self { runs, len }
    }

    /// The same samples as a single run
    pub fn compacted(&self) -> SampleRuns {
        if self.runs.len() <= 1 {
            return self.clone();
        }
        Self::from_sorted(self.to_vec())
    }

    /// Samples with `start_ns <= timestamp_ns <= end_ns`, in timestamp order.
    ///
    /// Borrowed when there is at most one run; otherwise only the in-range
    /// part of each run is merged.
    pub fn range(&self, start_ns: i64, end_ns: i64) -> Cow<'_, [Sample]> {
        match self.runs.as_slice() {
            [] => Cow::Borrowed(&[]),
            [run] => Cow::Borrowed(raw_range(run, start_ns, end_ns)),
            runs => Cow::Owned(runs.iter().fold(Vec::new(), |acc, run| {
                merge_two(&acc, raw_range(run, start_ns, end_ns))
            })),
        }
    }

    /// Every sample, in timestamp order
    pub fn all(&self) -> Cow<'_, [Sample]> {
        self.range(i64::MIN, i64::MAX)
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.all().into_owned()
    }
}
