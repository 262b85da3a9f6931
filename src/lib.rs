//! chronoscope - A multi-resolution time-series store
//!
//! Raw samples are kept in an append-only checksummed log and served at
//! any level of a fixed granularity chain, from single ticks up to years.
//! Coarse levels read from precomputed mean tables when they are current
//! and fall back to aggregating the raw samples otherwise.

pub mod cli;
pub mod engine;
pub mod granularity;
pub mod http_server;
pub mod ingest;
pub mod observability;
pub mod session;
pub mod storage;
