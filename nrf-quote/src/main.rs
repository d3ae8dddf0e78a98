//! nrf-quote - Nature Restoration Fund quote wizard service
//!
//! Configuration is resolved from CLI flags, environment, TOML file and
//! compiled defaults, in that order of priority.

use anyhow::{Context, Result};
use clap::Parser;
use nrf_common::config::{resolve_config, CliOverrides, ServiceConfig, SessionEngine};
use nrf_quote::session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use nrf_quote::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired SQLite sessions are purged
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "nrf-quote", version, about = "Nature Restoration Fund quote wizard")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "NRF_QUOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Session store: memory or sqlite
    #[arg(long)]
    session_engine: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            config_path: args.config,
            host: args.host,
            port: args.port,
            session_engine: args.session_engine,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args.into()).context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "nrf_quote={level},nrf_common={level},tower_http={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting NRF Quote (nrf-quote) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let store = open_session_store(&config).await?;
    let state = AppState::new(&config, store).context("Invalid building type configuration")?;
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("nrf-quote listening on http://{}", addr);
    info!("Quote wizard: http://{}/nrf-quote/start", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("nrf-quote stopped");
    Ok(())
}

async fn open_session_store(config: &ServiceConfig) -> Result<Arc<dyn SessionStore>> {
    let ttl_hours = config.session.ttl_hours;
    let store: Arc<dyn SessionStore> = match config.session.engine {
        SessionEngine::Memory => {
            warn!("Using in-memory sessions; answers are lost on restart");
            Arc::new(MemorySessionStore::with_ttl_hours(ttl_hours)?)
        }
        SessionEngine::Sqlite => {
            let path = &config.session.database_path;
            let store = SqliteSessionStore::open(path, ttl_hours)
                .await
                .with_context(|| format!("Failed to open session database {}", path.display()))?;
            Arc::new(store)
        }
    };

    info!("Session TTL: {}h", ttl_hours);
    spawn_purge_task(Arc::clone(&store));
    Ok(store)
}

/// Periodically delete sessions past their TTL
fn spawn_purge_task(store: Arc<dyn SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.purge_expired().await {
                error!("Session purge failed: {}", e);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
