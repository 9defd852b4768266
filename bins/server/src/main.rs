//! Timebill API Server
//!
//! Main entry point for the timebill back office service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timebill_api::{AppState, create_router};
use timebill_core::auth::SessionStore;
use timebill_db::{CollectionStore, InMemorySessionStore, Repositories, bootstrap};
use timebill_shared::{AppConfig, Clock, SystemClock};

/// How often expired sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timebill=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Open collection storage
    let store = CollectionStore::from_provider(&config.storage)?;
    info!(provider = config.storage.name(), "Collection storage ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repos = Repositories::new(store, Arc::clone(&clock));
    bootstrap(&repos, &config.bootstrap).await?;

    let sessions = Arc::new(InMemorySessionStore::new(Arc::clone(&clock)));
    spawn_session_sweeper(Arc::clone(&sessions));

    let session_ttl = config
        .session
        .ttl()
        .context("session.ttl_secs is out of range")?;

    // Create application state
    let state = AppState {
        repos,
        sessions,
        clock,
        session_ttl,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn spawn_session_sweeper(sessions: Arc<InMemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let expired = sessions.expire();
            if expired > 0 {
                debug!(expired, "expired sessions removed");
            }
        }
    });
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
