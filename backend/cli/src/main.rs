mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crossgrid_config::CrossgridConfig;
use crossgrid_core::{FsStorage, GameStore};
use crossgrid_gateway::{GatewayState, SessionManager};

#[derive(Parser)]
#[command(name = "crossgrid")]
#[command(about = "crossgrid: collaborative crossword server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the puzzle server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Path to the YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the games in the data directory
    Games {
        /// Path to the YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut cfg = load(config).await?;
            if let Some(port) = port {
                cfg.server.get_or_insert_with(Default::default).port = Some(port);
            }
            crossgrid_logging::init_logger(cfg.log_level(), cfg.log_dir().map(|p| p.as_path()));
            run_server(cfg).await?;
        }
        Commands::Games { config } => {
            let cfg = load(config).await?;
            let store = open_store(&cfg);
            for name in store.list().await? {
                println!("{name}");
            }
        }
    }

    Ok(())
}

async fn load(flag: Option<PathBuf>) -> Result<CrossgridConfig> {
    let path = config::resolve_config_path(flag);
    crossgrid_config::load_and_prepare(&path).await
}

fn open_store(cfg: &CrossgridConfig) -> GameStore {
    GameStore::new(Arc::new(FsStorage), cfg.data_dir())
}

async fn run_server(cfg: CrossgridConfig) -> Result<()> {
    let data_dir = cfg.data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let addr: SocketAddr = format!("{}:{}", cfg.bind(), cfg.port())
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cfg.bind(), cfg.port()))?;

    info!(
        %addr,
        data_dir = %data_dir.display(),
        write_back_delay_ms = cfg.write_back_delay().as_millis() as u64,
        "Starting crossgrid server"
    );

    let sessions = SessionManager::new(open_store(&cfg), config::session_settings(&cfg));
    let state = GatewayState::new(sessions, config::gateway_settings(&cfg));

    crossgrid_gateway::start_server(addr, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}
