//! cgbench dashboard server binary

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cgbench_common::config::DashboardConfig;

#[derive(Parser)]
#[command(name = "cgbench-dashboard")]
#[command(about = "Live dashboard for cgroup I/O benchmarking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML); defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address, overrides the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Enable development mode (more verbose logging)
    #[arg(long)]
    dev: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve,
    /// Validate the configuration and print the effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.dev { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    config.validate()?;

    match cli.command {
        Some(Commands::Serve) | None => cgbench_dashboard::server::serve(config).await,
        Some(Commands::CheckConfig) => {
            info!("configuration is valid");
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
