//! The aggregation engine
//!
//! Readers load the current `Snapshot` lock-free through `ArcSwap`. Writers
//! (ingest and rebuild) serialize on the sample-log mutex, derive a new
//! snapshot and publish it with a single store. No reader ever observes a
//! half-applied batch or a half-built table set.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use serde::Serialize;

use super::errors::{EngineError, EngineResult};
use super::point::Point;
use super::query::{execute, QueryPath};
use super::runs::SampleRuns;
use super::snapshot::{AggregateSet, Snapshot, Stats};
use crate::granularity::{registry, Granularity, GranularityRegistry};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};
use crate::storage::{sample_log_path, Sample, StorageReader, StorageWriter};

/// Points of a query together with the level that produced them
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub granularity: &'static str,
    pub points: Vec<Point>,
}

/// Outcome of `Engine::rebuild_aggregates`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub version: u64,
    pub samples: usize,
    pub buckets: usize,
}

/// Owns raw samples, aggregate tables and the optional on-disk sample log
pub struct Engine {
    registry: &'static GranularityRegistry,
    current: ArcSwap<Snapshot>,
    /// `None` for a purely in-memory engine
    log: Mutex<Option<StorageWriter>>,
    metrics: Arc<MetricsRegistry>,
}

impl Engine {
    /// An engine with no durable storage
    pub fn in_memory() -> Self {
        Self::from_parts(None, Vec::new(), Arc::new(MetricsRegistry::new()))
    }

    /// Opens `data_dir`, replays its sample log and builds the aggregates.
    ///
    /// A corrupt or truncated log is refused rather than partially loaded.
    pub fn open(data_dir: &Path) -> EngineResult<Self> {
        Self::open_with_metrics(data_dir, Arc::new(MetricsRegistry::new()))
    }

    pub fn open_with_metrics(data_dir: &Path, metrics: Arc<MetricsRegistry>) -> EngineResult<Self> {
        let path = sample_log_path(data_dir);
        let samples = if path.exists() {
            let replayed = StorageReader::open(&path).and_then(|mut reader| reader.read_all());
            match replayed {
                Ok(samples) => samples,
                Err(e) => {
                    if e.is_fatal() {
                        log_event_with_fields(
                            Event::StorageCorruption,
                            &[
                                ("path", &path.display().to_string()),
                                ("error", &e.to_string()),
                            ],
                        );
                    }
                    return Err(EngineError::Storage(e));
                }
            }
        } else {
            Vec::new()
        };

        let writer = StorageWriter::open(data_dir)?;
        let count = samples.len().to_string();
        log_event_with_fields(
            Event::StorageOpened,
            &[
                ("path", &writer.path().display().to_string()),
                ("samples", &count),
            ],
        );

        let engine = Self::from_parts(Some(writer), samples, metrics);
        engine.rebuild_aggregates();
        Ok(engine)
    }

    fn from_parts(
        log: Option<StorageWriter>,
        mut samples: Vec<Sample>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        samples.sort_by_key(|s| s.timestamp_ns);
        let stats = Stats::default().extend(&samples);
        let snapshot = Snapshot::empty().with_raw(SampleRuns::from_sorted(samples), stats);

        Self {
            registry: registry(),
            current: ArcSwap::from_pointee(snapshot),
            log: Mutex::new(log),
            metrics,
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, Option<StorageWriter>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> &'static GranularityRegistry {
        self.registry
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Appends a batch durably, then publishes it.
    ///
    /// Aggregates are not rebuilt; until `rebuild_aggregates` runs, queries
    /// answer on the fly from raw samples. Returns the number of samples
    /// accepted.
    pub fn ingest(&self, batch: Vec<Sample>) -> EngineResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut log = self.lock_log();
        if let Some(writer) = log.as_mut() {
            writer.append_batch(&batch)?;
        }

        let accepted = batch.len();
        let current = self.current.load_full();
        let stats = current.stats().extend(&batch);
        let raw = current.raw().push(batch);
        self.current.store(Arc::new(current.with_raw(raw, stats)));
        drop(log);

        self.metrics.add_samples_ingested(accepted as u64);
        self.metrics.increment_ingest_batches();
        log_event_with_fields(Event::IngestBatch, &[("samples", &accepted.to_string())]);
        Ok(accepted)
    }

    /// Recomputes every non-finest table from the current raw samples and
    /// publishes them in one step.
    pub fn rebuild_aggregates(&self) -> RebuildSummary {
        let _log = self.lock_log();
        let scope = ObservationScope::new("REBUILD");

        let current = self.current.load_full();
        let raw = current.raw().compacted();
        let set = AggregateSet::build(self.registry, &raw.all(), current.raw_generation());
        let buckets = set.bucket_count();
        let next = current.with_aggregates(raw, set);
        let summary = RebuildSummary {
            version: next.version(),
            samples: next.raw().len(),
            buckets,
        };
        self.current.store(Arc::new(next));

        self.metrics.increment_rebuilds();
        scope.complete_with_fields(&[
            ("samples", &summary.samples.to_string()),
            ("buckets", &summary.buckets.to_string()),
        ]);
        summary
    }

    /// Points in `[start_ns, end_ns]` at `granularity`.
    ///
    /// Uses the precomputed tables when they reflect every raw sample and
    /// aggregates on the fly otherwise. `start_ns > end_ns` yields nothing.
    pub fn query(&self, start_ns: i64, end_ns: i64, granularity: &Granularity) -> Vec<Point> {
        let snapshot = self.current.load();
        let path = if snapshot.aggregates_current() {
            QueryPath::Precomputed
        } else {
            QueryPath::OnTheFly
        };
        let points = execute(&snapshot, granularity, start_ns, end_ns, path);
        self.metrics.increment_queries_executed();
        points
    }

    /// Like `query`, but forces the evaluation path.
    ///
    /// A forced precomputed read fails when the tables are stale.
    pub fn query_via(
        &self,
        path: QueryPath,
        start_ns: i64,
        end_ns: i64,
        granularity: &Granularity,
    ) -> EngineResult<Vec<Point>> {
        let snapshot = self.current.load();
        if path == QueryPath::Precomputed
            && !granularity.is_finest()
            && !snapshot.aggregates_current()
        {
            return Err(EngineError::AggregatesUnavailable {
                granularity: granularity.symbol.to_string(),
            });
        }
        let points = execute(&snapshot, granularity, start_ns, end_ns, path);
        self.metrics.increment_queries_executed();
        Ok(points)
    }

    /// Query by symbol; without one, the level is chosen from the span.
    pub fn query_symbol(
        &self,
        start_ns: i64,
        end_ns: i64,
        symbol: Option<&str>,
    ) -> EngineResult<QueryResult> {
        let granularity = match symbol {
            Some(symbol) => match self.registry.lookup(symbol) {
                Ok(g) => g,
                Err(e) => {
                    self.metrics.increment_queries_rejected();
                    log_event_with_fields(
                        Event::QueryRejected,
                        &[("granularity", symbol), ("code", e.code())],
                    );
                    return Err(e.into());
                }
            },
            None => self
                .registry
                .select_for_span(end_ns.saturating_sub(start_ns)),
        };

        let points = self.query(start_ns, end_ns, granularity);
        log_event_with_fields(
            Event::QueryExecuted,
            &[
                ("granularity", granularity.symbol),
                ("points", &points.len().to_string()),
            ],
        );

        Ok(QueryResult {
            granularity: granularity.symbol,
            points,
        })
    }

    pub fn stats(&self) -> Stats {
        self.current.load().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::point::PointValue;
    use crate::granularity::NS_PER_SECOND;
    use tempfile::TempDir;

    fn seconds(engine: &Engine) -> &'static Granularity {
        engine.registry().lookup("1s").unwrap()
    }

    #[test]
    fn test_ingest_then_query_raw() {
        let engine = Engine::in_memory();
        engine
            .ingest(vec![Sample::new(5, 50), Sample::new(1, 10)])
            .unwrap();

        let points = engine.query(0, 10, engine.registry().finest());
        assert_eq!(points, vec![Point::raw(1, 10), Point::raw(5, 50)]);
    }

    #[test]
    fn test_query_aggregates_before_rebuild() {
        let engine = Engine::in_memory();
        engine
            .ingest(vec![
                Sample::new(0, 10),
                Sample::new(NS_PER_SECOND / 2, 20),
                Sample::new(NS_PER_SECOND, 40),
            ])
            .unwrap();

        let snapshot = engine.snapshot();
        assert!(!snapshot.aggregates_current());

        let points = engine.query(0, 2 * NS_PER_SECOND, seconds(&engine));
        assert_eq!(
            points,
            vec![Point::mean(0, 15.0), Point::mean(NS_PER_SECOND, 40.0)]
        );
    }

    #[test]
    fn test_rebuild_makes_aggregates_current() {
        let engine = Engine::in_memory();
        engine.ingest(vec![Sample::new(0, 1)]).unwrap();

        let summary = engine.rebuild_aggregates();
        assert_eq!(summary.samples, 1);
        assert!(engine.snapshot().aggregates_current());
        assert_eq!(engine.metrics().snapshot().rebuilds, 1);
    }

    #[test]
    fn test_query_via_precomputed_refuses_stale_tables() {
        let engine = Engine::in_memory();
        engine.ingest(vec![Sample::new(0, 1)]).unwrap();

        let err = engine
            .query_via(QueryPath::Precomputed, 0, 10, seconds(&engine))
            .unwrap_err();
        assert_eq!(err.code(), "CHRONO_AGGREGATES_UNAVAILABLE");

        engine.rebuild_aggregates();
        let points = engine
            .query_via(QueryPath::Precomputed, 0, 10, seconds(&engine))
            .unwrap();
        assert_eq!(points, vec![Point::mean(0, 1.0)]);
    }

    #[test]
    fn test_single_sample_bucket_is_floating() {
        let engine = Engine::in_memory();
        engine.ingest(vec![Sample::new(0, 10)]).unwrap();
        engine.rebuild_aggregates();

        let points = engine.query(0, 10, seconds(&engine));
        assert_eq!(points[0].value, PointValue::Mean(10.0));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let engine = Engine::in_memory();
        engine.ingest(vec![Sample::new(0, 10)]).unwrap();
        assert!(engine.query(10, 0, engine.registry().finest()).is_empty());
    }

    #[test]
    fn test_query_symbol_unknown() {
        let engine = Engine::in_memory();
        let err = engine.query_symbol(0, 10, Some("2s")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.metrics().snapshot().queries_rejected, 1);
    }

    #[test]
    fn test_query_symbol_selects_from_span() {
        let engine = Engine::in_memory();
        let result = engine.query_symbol(0, 2 * 86_400 * NS_PER_SECOND, None).unwrap();
        assert_eq!(result.granularity, "1h");
    }

    #[test]
    fn test_stats() {
        let engine = Engine::in_memory();
        assert_eq!(engine.stats().count, 0);

        engine
            .ingest(vec![Sample::new(10, -5), Sample::new(2, 7)])
            .unwrap();
        let stats = engine.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min_timestamp_ns, Some(2));
        assert_eq!(stats.max_timestamp_ns, Some(10));
        assert_eq!(stats.min_value, Some(-5));
        assert_eq!(stats.max_value, Some(7));
    }

    #[test]
    fn test_open_replays_sample_log() {
        let dir = TempDir::new().unwrap();
        {
            let engine = Engine::open(dir.path()).unwrap();
            engine
                .ingest(vec![Sample::new(1, 1), Sample::new(2, 2)])
                .unwrap();
        }

        let engine = Engine::open(dir.path()).unwrap();
        assert_eq!(engine.stats().count, 2);
        assert!(engine.snapshot().aggregates_current());
    }
}
