//! ongi-artifacts - artifact records and AI descriptions
//!
//! Serves the artifact API on port 5810 by default and streams AI-written
//! descriptions from a local Ollama instance.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ongi_artifacts::config::ServiceConfig;
use ongi_artifacts::generation::{DescriptionGenerator, OllamaClient};
use ongi_artifacts::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ongi-artifacts")]
#[command(about = "Artifact records with streamed AI descriptions", long_about = None)]
#[command(version)]
struct Args {
    /// Path to ongi-artifacts.toml
    #[arg(short, long, env = "ONGI_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "ONGI_ARTIFACTS_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(short, long, env = "ONGI_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before the subscriber exists so its log level can apply
    let mut config = ServiceConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Build identification first, before any slow startup work
    info!(
        "Starting ongi-artifacts v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = ongi_artifacts::db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let client = OllamaClient::new(config.ollama.clone())
        .context("Failed to create Ollama client")?;
    info!(
        "Ollama: {} (model {}, timeout {} ms)",
        client.config().base_url,
        client.model_id(),
        client.config().timeout_ms
    );

    if config.staff_token.is_none() {
        info!("No staff token configured; privileged endpoints will refuse all callers");
    }

    let state = AppState::new(db_pool, Arc::new(client), config.staff_token.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("ongi-artifacts listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
