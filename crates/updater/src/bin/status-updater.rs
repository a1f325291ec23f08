//! status-updater: stores status events from the queue and expires old ones.
//!
//! # Usage
//!
//! ```bash
//! # Run the ingestor (default subcommand)
//! status-updater --config config/status.toml
//!
//! # One-off retention sweep
//! status-updater cleanup --days 7
//!
//! # No config file: defaults plus STATUS_* environment overrides
//! STATUS_MESSAGING_BACKEND=zmq STATUS_MESSAGING_ENDPOINT=tcp://127.0.0.1:5556 status-updater
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use status_core::config::{load_dotenv, UpdaterConfig, BACKEND_MEMORY};
use status_updater::{retention, IngestorError, StatusIngestor};
use tracing::{info, warn};

// ── CLI ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "status-updater", version, about)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, short, env = "STATUS_CONFIG", default_value = "config/status.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to the status topic and store events until signalled.
    Run,
    /// Delete records older than the retention window, then exit.
    Cleanup {
        /// Retention window in days, at least 1 (defaults to `retention.days` from config).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,
    },
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli.config)?;
    config.log_summary();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Cleanup { days } => cleanup(&config, days.unwrap_or(config.retention.days)).await,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<UpdaterConfig> {
    if path.exists() {
        let config = UpdaterConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    } else {
        warn!(path = %path.display(), "config file not found, using defaults and environment");
        UpdaterConfig::from_env().context("invalid config from environment")
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// The memory bus lives inside this process, so no outside publisher can reach it.
fn unreachable_messaging(config: &UpdaterConfig) -> bool {
    config.messaging.backend == BACKEND_MEMORY
}

async fn run(config: &UpdaterConfig) -> anyhow::Result<()> {
    if unreachable_messaging(config) {
        warn!(
            "messaging backend is 'memory': no external publisher can reach it and no events \
             will be stored; set messaging.backend = \"zmq\" to ingest from agents"
        );
    }

    let ingestor = Arc::new(
        StatusIngestor::connect(config)
            .await
            .context("failed to connect status updater backends")?,
    );

    let for_signal = ingestor.clone();
    let bridge = status_updater::signals::spawn_bridge(move |signal| {
        for_signal.stop(signal.name());
    })
    .context("failed to install signal handlers")?;

    let result = ingestor.start().await;
    bridge.abort();

    match result {
        Ok(()) => {}
        Err(IngestorError::Stopped) => info!("stopped before start, nothing to do"),
        Err(e) => return Err(e).context("status updater failed"),
    }

    info!("status-updater exited cleanly");
    Ok(())
}

async fn cleanup(config: &UpdaterConfig, days: u32) -> anyhow::Result<()> {
    let store = status_persistence::open_store(&config.persistence)
        .await
        .context("failed to open record store")?;
    let deleted = retention::cleanup_old_entries(store.as_ref(), days).await?;
    info!(deleted, retention_days = days, "cleanup finished");
    Ok(())
}
