//! CLI module for chronoscope
//!
//! Provides command-line interface for:
//! - init: Create the data directory and an empty sample log
//! - serve: Boot and serve HTTP/WebSocket
//! - load: Bulk-load a CSV file
//! - query: One-shot range query
//! - stats: Dataset summary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, load, query, run, run_command, serve, stats, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
