//! Granularity registry for chronoscope
//!
//! A granularity is a named resolution level defining a bucket width in
//! nanoseconds. The levels form a strictly ordered chain from the finest
//! ("1t", one nanosecond tick) to the coarsest ("1y").
//!
//! # Design Principles
//!
//! - Built once at process start, never mutated
//! - Array of value structs with integer up/down links (no node cycles)
//! - O(1) neighbour lookup in both directions
//!
//! # Invariants Enforced
//!
//! - For every level `g` with `g.up`: `g.up.down == g`
//! - `g.up.ns_size > g.ns_size`

mod errors;
mod registry;

pub use errors::{GranularityError, GranularityResult};
pub use registry::{
    registry, Granularity, GranularityId, GranularityRegistry, NS_PER_DAY, NS_PER_HOUR,
    NS_PER_MINUTE, NS_PER_SECOND,
};
