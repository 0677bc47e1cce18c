//! HTTP entry point for the velovia routing service.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use velovia_server::api::{AppState, create_router};
use velovia_server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "velovia-server")]
#[command(about = "Safety-aware pedestrian and bike routing service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "velovia.toml")]
    config: PathBuf,

    /// Listen address, overriding the configuration file
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::from_file(&cli.config)?;
    let listen = cli.listen.unwrap_or(config.listen);

    let engine_config = config.engine.clone();
    let state = tokio::task::spawn_blocking(move || AppState::initialize(&engine_config)).await?;
    if !state.startup_errors.is_empty() {
        error!("starting degraded; routing endpoints answer 503 until restarted with good data");
    }

    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("listening on http://{listen}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(signal_error) => {
            error!("cannot listen for the shutdown signal: {signal_error}");
            std::future::pending::<()>().await;
        }
    }
}
