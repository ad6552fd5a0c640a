//! CLI command implementations
//!
//! `serve` boots in a fixed order: configuration, logger level, runtime,
//! connection pool, HTTP listener. Shutdown closes the pool after the
//! listener has drained.

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::store::{PgStore, PopulationStore};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(config.as_deref(), port),
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// Load the effective configuration. `port` wins over file and environment.
pub fn load_config(config_path: Option<&Path>, port: Option<u16>) -> CliResult<AppConfig> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }
    Ok(config)
}

/// Connect to the database and serve until a shutdown signal
pub fn serve(config_path: Option<&Path>, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let config = match load_config(config_path, port) {
        Ok(config) => config,
        Err(e) => {
            log_event_with_fields(Event::BootFailed, &[("reason", e.message())]);
            return Err(e);
        }
    };
    Logger::set_min_severity(config.log_severity()?);

    let http_addr = config.http.socket_addr();
    let db_port = config.database.port.to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("db_host", config.database.host.as_str()),
            ("db_name", config.database.name.as_str()),
            ("db_port", db_port.as_str()),
            ("http_addr", http_addr.as_str()),
        ],
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let store = match PgStore::connect(&config.database).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(Event::BootFailed, &[("reason", reason.as_str())]);
                return Err(CliError::from(e));
            }
        };
        let pool_max = config.database.pool_max.to_string();
        log_event_with_fields(Event::PoolConnected, &[("pool_max", pool_max.as_str())]);

        let server = HttpServer::with_config(config.http.clone(), store.clone());
        let served = server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)));

        store.close().await;
        log_event(Event::ShutdownComplete);
        served
    })
}

/// Print the effective configuration as JSON, password redacted
pub fn check_config(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path, None)?;
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
