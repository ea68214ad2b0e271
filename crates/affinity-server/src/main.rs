use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use affinity_core::config::{AffinityConfig, CliOverrides};
use affinity_observability::init_tracing;
use affinity_server::{roles, Shutdown};

#[derive(Parser)]
#[command(author, version, about = "Event affinity pipeline", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "AFFINITY_CONFIG")]
    config: Option<PathBuf>,

    /// Analyzer database path
    #[arg(long)]
    db_path: Option<String>,

    /// Message log path
    #[arg(long)]
    log_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept user actions over HTTP and append them to the log
    Collector {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Fold user actions into pair similarities
    Aggregator,
    /// Persist actions and similarities, serve recommendation queries
    Analyzer {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Every role in one process
    Standalone,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        db_path: cli.db_path,
        log_path: cli.log_path,
    };
    let mut config = AffinityConfig::load(cli.config.as_deref(), Some(&overrides))
        .context("cannot load configuration")?;
    match &cli.command {
        Commands::Collector { bind: Some(bind) } => config.server.collector_bind = bind.clone(),
        Commands::Analyzer { bind: Some(bind) } => config.server.analyzer_bind = bind.clone(),
        _ => {}
    }

    init_tracing(&config.observability);

    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    match cli.command {
        Commands::Collector { .. } => roles::run_collector(&config, &shutdown).await?,
        Commands::Aggregator => roles::run_aggregator(&config, &shutdown).await?,
        Commands::Analyzer { .. } => roles::run_analyzer(&config, &shutdown).await?,
        Commands::Standalone => roles::run_standalone(&config, &shutdown).await?,
    }
    info!("shutdown complete");
    Ok(())
}
