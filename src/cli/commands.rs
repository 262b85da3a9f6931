//! CLI command implementations
//!
//! Every command loads and validates the config first. Commands that touch
//! data open the engine, which replays and verifies the whole sample log
//! before anything else happens.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::{Engine, EngineError};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::ingest::BulkLoader;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::storage::{sample_log_path, StorageWriter};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Listener, CORS and delivery settings; all optional
    #[serde(flatten)]
    pub server: HttpServerConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.server.chunk_size == 0 {
            return Err(CliError::config_error("chunk_size must be > 0"));
        }

        if self.server.ingest_batch_size == 0 {
            return Err(CliError::config_error("ingest_batch_size must be > 0"));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Load { config, file } => load(&config, &file),
        Command::Query {
            config,
            start_ns,
            end_ns,
            granularity,
        } => query(&config, start_ns, end_ns, granularity.as_deref()),
        Command::Stats { config } => stats(&config),
    }
}

/// Check if a data directory is initialized
fn is_initialized(data_dir: &Path) -> bool {
    sample_log_path(data_dir).exists()
}

/// Load config, require an initialized data directory and open the engine
fn boot(config_path: &Path) -> CliResult<(Config, Engine)> {
    log_event(Event::BootStart);

    let config = Config::load(config_path)?;
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &config.data_dir)]);

    if !is_initialized(config.data_path()) {
        return Err(CliError::not_initialized());
    }

    let engine = Engine::open(config.data_path()).map_err(|e| match e {
        EngineError::Storage(ref s) if s.is_fatal() => CliError::boot_failed(format!(
            "Sample log failed verification (FATAL): {}. Refusing to serve.",
            e
        )),
        other => CliError::boot_failed(format!("Engine open failed: {}", other)),
    })?;

    log_event(Event::BootComplete);
    Ok((config, engine))
}

/// Initialize a new data directory with an empty sample log
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let data_dir = config.data_path();

    if is_initialized(data_dir) {
        return Err(CliError::already_initialized());
    }

    StorageWriter::open(data_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create sample log in {:?}: {}", data_dir, e))
    })?;

    write_response(json!({"initialized": true, "data_dir": config.data_dir}))?;

    Ok(())
}

/// Start the HTTP server; `port` overrides the configured one
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let (config, engine) = boot(config_path)?;

    let mut http_config = config.server.clone();
    if let Some(port) = port {
        http_config.port = port;
    }
    let server = HttpServer::new(http_config, Arc::new(engine));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Bulk-load a CSV file, then print the load report and dataset stats
pub fn load(config_path: &Path, file: &Path) -> CliResult<()> {
    let (config, engine) = boot(config_path)?;

    let report = BulkLoader::with_batch_size(&engine, config.server.ingest_batch_size)
        .load_path(file)
        .map_err(|e| CliError::load_failed(format!("{}: {}", e.code(), e)))?;

    write_response(json!({
        "accepted": report.accepted,
        "skipped": report.skipped,
        "stats": engine.stats(),
    }))?;

    Ok(())
}

/// Run one query and print its points
pub fn query(
    config_path: &Path,
    start_ns: i64,
    end_ns: i64,
    granularity: Option<&str>,
) -> CliResult<()> {
    let (_config, engine) = boot(config_path)?;

    match engine.query_symbol(start_ns, end_ns, granularity) {
        Ok(result) => {
            write_response(serde_json::to_value(&result)?)?;
            Ok(())
        }
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(CliError::query_rejected(e.to_string()))
        }
    }
}

/// Print sample count and extremes
pub fn stats(config_path: &Path) -> CliResult<()> {
    let (_config, engine) = boot(config_path)?;
    write_response(serde_json::to_value(engine.stats())?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("chronoscope.json");
        let data_dir = temp_dir.path().join("store");

        let config = json!({
            "data_dir": data_dir.to_string_lossy()
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_init_creates_sample_log() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        assert!(sample_log_path(&temp_dir.path().join("store")).exists());
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path).unwrap();

        let result = init(&config_path);
        assert_eq!(
            result.unwrap_err().code(),
            &CliErrorCode::AlreadyInitialized
        );
    }

    #[test]
    fn test_stats_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let result = stats(&config_path);
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_load_then_query() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path).unwrap();

        let csv = temp_dir.path().join("data.csv");
        fs::write(&csv, "Timestamp,Value\n0,10\n1000000000,20\nbroken\n").unwrap();
        load(&config_path, &csv).unwrap();

        query(&config_path, 0, 2_000_000_000, Some("1s")).unwrap();
        stats(&config_path).unwrap();

        let result = query(&config_path, 0, 10, Some("7q"));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::QueryRejected);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path).unwrap();

        let result = load(&config_path, &temp_dir.path().join("absent.csv"));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::LoadFailed);
    }

    #[test]
    fn test_config_rejects_zero_chunk_size() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("chronoscope.json");

        let config = json!({
            "data_dir": temp_dir.path().join("store").to_string_lossy(),
            "chunk_size": 0
        });
        fs::write(&config_path, config.to_string()).unwrap();

        let result = Config::load(&config_path);
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.server.port, 54321);
        assert_eq!(config.server.chunk_size, 5_000);
        assert_eq!(config.server.ingest_batch_size, 100_000);
    }

    #[test]
    fn test_corrupt_log_refuses_boot() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path).unwrap();

        let log = sample_log_path(&temp_dir.path().join("store"));
        fs::write(&log, [0u8; 7]).unwrap();

        let result = stats(&config_path);
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::BootFailed);
    }
}
