mod config;
mod probe;

use crate::config::{DEFAULT_CONFIG_PATH, ProbeConfig};
use crate::probe::{DEFAULT_PATHS, prove_connectivity};
use anyhow::{Context, Result};
use clap::Parser;
use opc_scanner::{DEFAULT_MAX_RETRIES, DEFAULT_SERVER, DefaultClient, OpcScanner};
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Name this tool announces to OPC servers.
const CLIENT_NAME: &str = "opc-probe";

/// Validate connectivity to an OPC DA server by reading known data points.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON file providing OPC_HOST and OPC_HOST_ALT
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Connect to OPC_HOST_ALT instead of OPC_HOST
    #[arg(long)]
    alt_host: bool,

    /// Server ProgID to connect to
    #[arg(long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Read attempts budget per data point
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Directory for the rolling log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Data point paths to read
    paths: Vec<String>,
}

fn init_logging(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "opc-probe.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_filter(filter))
        .init();

    guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_dir);

    tracing::info!("Starting OPC probe");

    let config = match ProbeConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            println!(
                "Could not load configuration from '{}'. Exiting.",
                cli.config.display()
            );
            tracing::error!(error = %e, "configuration load failed");
            return Err(e.into());
        }
    };

    let paths: Vec<String> = if cli.paths.is_empty() {
        DEFAULT_PATHS.iter().map(ToString::to_string).collect()
    } else {
        cli.paths.clone()
    };
    let host = config.host(cli.alt_host);
    tracing::info!(host, server = %cli.server, points = paths.len(), "probing");

    let client = DefaultClient::new(CLIENT_NAME).context("Failed to initialize OPC client")?;
    let mut scanner = OpcScanner::new(client, host).with_server(cli.server.as_str());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let readings = prove_connectivity(&mut scanner, &paths, cli.max_retries, &mut out)?;

    let failed: Vec<&str> = readings
        .iter()
        .filter(|r| !r.outcome.is_value())
        .map(|r| r.path.as_str())
        .collect();
    tracing::info!(
        read = readings.len() - failed.len(),
        failed = failed.len(),
        "probe finished"
    );
    if !failed.is_empty() {
        tracing::warn!(paths = ?failed, "points without a value");
    }

    Ok(())
}
