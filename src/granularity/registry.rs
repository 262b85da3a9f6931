//! The granularity chain and span-based selection
//!
//! Levels are stored finest first. `up` points at the next coarser level,
//! `down` at the next finer one. Both links are indices into the same array.

use std::sync::OnceLock;

use serde::Serialize;

use super::errors::{GranularityError, GranularityResult};

pub const NS_PER_SECOND: i64 = 1_000_000_000;
pub const NS_PER_MINUTE: i64 = 60 * NS_PER_SECOND;
pub const NS_PER_HOUR: i64 = 60 * NS_PER_MINUTE;
pub const NS_PER_DAY: i64 = 24 * NS_PER_HOUR;

/// Index of a level inside the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GranularityId(usize);

impl GranularityId {
    /// Returns the position in the chain (0 = finest)
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A named resolution level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Granularity {
    #[serde(skip)]
    pub id: GranularityId,
    /// Short symbol, e.g. "1s", "1mon"
    pub symbol: &'static str,
    /// Display name, e.g. "1 second"
    pub name: &'static str,
    /// Smallest number of buckets a client view should show at this level
    pub min_val: u32,
    /// Largest number of buckets a client view should show at this level
    pub max_val: u32,
    /// Nominal point budget for a view at this level
    pub size: u32,
    /// Bucket width in nanoseconds
    pub ns_size: i64,
    #[serde(skip)]
    pub down: Option<GranularityId>,
    #[serde(skip)]
    pub up: Option<GranularityId>,
}

impl Granularity {
    /// Whether this is the finest (raw) level
    pub fn is_finest(&self) -> bool {
        self.down.is_none()
    }

    /// Whether this is the coarsest level
    pub fn is_coarsest(&self) -> bool {
        self.up.is_none()
    }
}

// (symbol, name, min_val, max_val, size, ns_size), finest first
const LEVELS: [(&str, &str, u32, u32, u32, i64); 9] = [
    ("1t", "1 tick", 1, 400, 2000, 1),
    ("1s", "1 second", 2, 120, 2400, NS_PER_SECOND),
    ("1m", "1 minute", 2, 10, 2400, NS_PER_MINUTE),
    ("5m", "5 minutes", 2, 24, 1344, 5 * NS_PER_MINUTE),
    ("1h", "1 hour", 2, 24, 1344, NS_PER_HOUR),
    ("1d", "1 day", 2, 14, 112, NS_PER_DAY),
    ("1w", "1 week", 2, 8, 192, 7 * NS_PER_DAY),
    ("1mon", "1 month", 2, 24, 240, 30 * NS_PER_DAY),
    ("1y", "1 year", 2, 10, 100, 365 * NS_PER_DAY),
];

const DEFAULT_SYMBOL: &str = "1m";

/// Immutable ordered chain of resolution levels
#[derive(Debug)]
pub struct GranularityRegistry {
    levels: Vec<Granularity>,
}

impl GranularityRegistry {
    /// Builds the standard nine-level chain
    pub fn standard() -> Self {
        let last = LEVELS.len() - 1;
        let levels = LEVELS
            .iter()
            .enumerate()
            .map(|(i, &(symbol, name, min_val, max_val, size, ns_size))| Granularity {
                id: GranularityId(i),
                symbol,
                name,
                min_val,
                max_val,
                size,
                ns_size,
                down: if i == 0 { None } else { Some(GranularityId(i - 1)) },
                up: if i == last { None } else { Some(GranularityId(i + 1)) },
            })
            .collect();

        Self { levels }
    }

    /// Returns the level with the given id
    pub fn get(&self, id: GranularityId) -> &Granularity {
        &self.levels[id.0]
    }

    /// Looks up a level by symbol
    pub fn lookup(&self, symbol: &str) -> GranularityResult<&Granularity> {
        self.levels
            .iter()
            .find(|g| g.symbol == symbol)
            .ok_or_else(|| GranularityError::NotFound {
                symbol: symbol.to_string(),
                valid: self.symbols(),
            })
    }

    /// The next finer level (`down` link)
    pub fn finer(&self, g: &Granularity) -> Option<&Granularity> {
        g.down.map(|id| self.get(id))
    }

    /// The next coarser level (`up` link)
    pub fn coarser(&self, g: &Granularity) -> Option<&Granularity> {
        g.up.map(|id| self.get(id))
    }

    pub fn finest(&self) -> &Granularity {
        &self.levels[0]
    }

    pub fn coarsest(&self) -> &Granularity {
        &self.levels[self.levels.len() - 1]
    }

    /// Level used when a client states no preference and no span is known
    pub fn default_granularity(&self) -> &Granularity {
        self.levels
            .iter()
            .find(|g| g.symbol == DEFAULT_SYMBOL)
            .unwrap_or_else(|| self.finest())
    }

    /// Iterates levels finest to coarsest
    pub fn iter(&self) -> impl Iterator<Item = &Granularity> {
        self.levels.iter()
    }

    /// All symbols, finest to coarsest
    pub fn symbols(&self) -> Vec<&'static str> {
        self.levels.iter().map(|g| g.symbol).collect()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Picks a level for a window of `span_ns` nanoseconds.
    ///
    /// Cut points are half-open from above:
    ///
    /// | span            | level |
    /// |-----------------|-------|
    /// | > 10d           | 1d    |
    /// | (1d, 10d]       | 1h    |
    /// | (1h, 1d]        | 1m    |
    /// | (1m, 1h]        | 1s    |
    /// | <= 1m           | 1t    |
    pub fn select_for_span(&self, span_ns: i64) -> &Granularity {
        let symbol = if span_ns > 10 * NS_PER_DAY {
            "1d"
        } else if span_ns > NS_PER_DAY {
            "1h"
        } else if span_ns > NS_PER_HOUR {
            "1m"
        } else if span_ns > NS_PER_MINUTE {
            "1s"
        } else {
            "1t"
        };
        self.lookup(symbol).unwrap_or_else(|_| self.finest())
    }
}

/// Process-wide registry, built on first use
pub fn registry() -> &'static GranularityRegistry {
    static REGISTRY: OnceLock<GranularityRegistry> = OnceLock::new();
    REGISTRY.get_or_init(GranularityRegistry::standard)
}
