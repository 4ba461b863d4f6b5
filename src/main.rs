//! Exam portal server
//!
//! Usage:
//!   exam-portal --config portal.yaml --port 8080
//!
//! Without `--config` the built-in collections are served. Records, files and
//! accounts are kept in memory.

use anyhow::{Context, Result};
use clap::Parser;
use exam_portal::config::PortalConfig;
use exam_portal::server::ServerBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "exam-portal")]
#[command(about = "Exam portal admin console and user dashboard API")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => PortalConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PortalConfig::default_config(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = config.server.address();
    tracing::info!(
        collections = config.collections.len(),
        admins = config.admins.len(),
        "Exam portal starting"
    );

    ServerBuilder::new()
        .with_config(config)
        .in_memory()
        .serve(&addr)
        .await
}
