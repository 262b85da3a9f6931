//! Bulk ingest of delimited `timestamp_ns,value` text
//!
//! - An optional first line containing `Timestamp,Value` is skipped
//! - Blank lines are ignored
//! - Malformed lines are skipped and counted, never fatal
//! - Samples reach the engine in batches; aggregates rebuild once at the end

mod errors;
mod loader;
mod parser;

pub use errors::{IngestError, IngestResult};
pub use loader::{check_csv_filename, BulkLoader, IngestReport, DEFAULT_BATCH_SIZE};
pub use parser::{is_header, parse_line, ParsedLine, HEADER_MARKER};
