//! CLI argument definitions using clap
//!
//! Commands:
//! - chronoscope init --config <path>
//! - chronoscope serve --config <path> [--port <port>]
//! - chronoscope load --config <path> --file <csv>
//! - chronoscope query --config <path> --start-ns <ns> --end-ns <ns> [--granularity <symbol>]
//! - chronoscope stats --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chronoscope - A multi-resolution time-series store
#[derive(Parser, Debug)]
#[command(name = "chronoscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./chronoscope.json")]
        config: PathBuf,
    },

    /// Start the HTTP and WebSocket server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./chronoscope.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Bulk-load a CSV file of timestamp_ns,value lines
    Load {
        /// Path to configuration file
        #[arg(long, default_value = "./chronoscope.json")]
        config: PathBuf,

        /// CSV file to load
        #[arg(long)]
        file: PathBuf,
    },

    /// Run one range query and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./chronoscope.json")]
        config: PathBuf,

        /// Range start, inclusive
        #[arg(long, allow_hyphen_values = true)]
        start_ns: i64,

        /// Range end, inclusive
        #[arg(long, allow_hyphen_values = true)]
        end_ns: i64,

        /// Granularity symbol; chosen from the span when omitted
        #[arg(long)]
        granularity: Option<String>,
    },

    /// Print sample count and extremes
    Stats {
        /// Path to configuration file
        #[arg(long, default_value = "./chronoscope.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
