//! Batched bulk loading into the engine

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use super::errors::{IngestError, IngestResult};
use super::parser::{is_header, parse_line, ParsedLine};
use crate::engine::Engine;
use crate::observability::{log_event_with_fields, warn_event, Event, ObservationScope};
use crate::storage::Sample;

pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: u64,
    pub skipped: u64,
}

/// Rejects upload names that do not end in `.csv`
pub fn check_csv_filename(filename: &str) -> IngestResult<()> {
    if filename.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(IngestError::NotCsv {
            filename: filename.to_string(),
        })
    }
}

/// Streams lines into the engine in fixed-size batches
pub struct BulkLoader<'a> {
    engine: &'a Engine,
    batch_size: usize,
}

impl<'a> BulkLoader<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self::with_batch_size(engine, DEFAULT_BATCH_SIZE)
    }

    /// A `batch_size` of zero is treated as one
    pub fn with_batch_size(engine: &'a Engine, batch_size: usize) -> Self {
        Self {
            engine,
            batch_size: batch_size.max(1),
        }
    }

    pub fn load_path(&self, path: &Path) -> IngestResult<IngestReport> {
        let file = File::open(path)?;
        self.load_reader(BufReader::new(file))
    }

    pub fn load_str(&self, text: &str) -> IngestResult<IngestReport> {
        self.load_reader(text.as_bytes())
    }

    /// Loads every line of `reader`, then rebuilds the aggregates once.
    ///
    /// Malformed lines are skipped and counted; they never abort the load.
    /// Lines that are not valid UTF-8 count as malformed.
    pub fn load_reader<R: BufRead>(&self, mut reader: R) -> IngestResult<IngestReport> {
        let scope = ObservationScope::with_fields(
            "BULK_LOAD",
            &[("batch_size", &self.batch_size.to_string())],
        );

        match self.load_lines(&mut reader) {
            Ok(report) => {
                self.engine.rebuild_aggregates();
                self.engine.metrics().add_records_skipped(report.skipped);

                let accepted = report.accepted.to_string();
                let skipped = report.skipped.to_string();
                log_event_with_fields(
                    Event::IngestComplete,
                    &[("accepted", &accepted), ("skipped", &skipped)],
                );
                scope.complete_with_fields(&[("accepted", &accepted), ("skipped", &skipped)]);
                Ok(report)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn load_lines<R: BufRead>(&self, reader: &mut R) -> IngestResult<IngestReport> {
        let mut report = IngestReport::default();
        let mut batch: Vec<Sample> = Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE));
        let mut buf = Vec::new();
        let mut first = true;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                report.skipped += 1;
                first = false;
                continue;
            };

            if first {
                first = false;
                if is_header(line) {
                    continue;
                }
                warn_event(Event::IngestHeaderMissing, &[("first_line", line.trim())]);
            }

            match parse_line(line) {
                ParsedLine::Sample(sample) => {
                    batch.push(sample);
                    if batch.len() >= self.batch_size {
                        report.accepted += self.engine.ingest(std::mem::take(&mut batch))? as u64;
                    }
                }
                ParsedLine::Blank => {}
                ParsedLine::Malformed(_) => report.skipped += 1,
            }
        }

        if !batch.is_empty() {
            report.accepted += self.engine.ingest(batch)? as u64;
        }
        Ok(report)
    }
}
