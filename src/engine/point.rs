//! Query output types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::Sample;

/// Value of a query point.
///
/// Finest-granularity reads return stored integers untouched; aggregated
/// reads return floating means, even for single-sample buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Raw(i64),
    Mean(f64),
}

impl PointValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            PointValue::Raw(v) => v as f64,
            PointValue::Mean(v) => v,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointValue::Raw(v) => write!(f, "{}", v),
            PointValue::Mean(v) => write!(f, "{}", v),
        }
    }
}

/// One `(timestamp_ns, value)` pair of a query result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp_ns: i64,
    pub value: PointValue,
}

impl Point {
    pub fn raw(timestamp_ns: i64, value: i64) -> Self {
        Self {
            timestamp_ns,
            value: PointValue::Raw(value),
        }
    }

    pub fn mean(timestamp_ns: i64, value: f64) -> Self {
        Self {
            timestamp_ns,
            value: PointValue::Mean(value),
        }
    }
}

impl From<&Sample> for Point {
    fn from(sample: &Sample) -> Self {
        Self::raw(sample.timestamp_ns, sample.value)
    }
}
