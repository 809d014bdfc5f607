//! HTTP server initialization and runtime setup.
//!
//! Handles store selection, limiter startup, and the Axum server lifecycle.

use crate::application::services::{AdmissionService, AuthService, LinkService, StatsService};
use crate::config::Config;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::repositories::{ClickStore, UrlStore};
use crate::infrastructure::persistence::{
    MemoryClickStore, MemoryUrlStore, PgClickStore, PgUrlStore,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// URL and click stores sharing one backend.
pub struct Stores {
    pub urls: Arc<dyn UrlStore>,
    pub clicks: Arc<dyn ClickStore>,
}

/// Opens the configured stores: PostgreSQL when a URL is set, memory otherwise.
///
/// # Errors
///
/// Returns an error if the database is unreachable or migrations fail.
pub async fn connect_stores(config: &Config) -> Result<Stores> {
    let Some(ref database_url) = config.database_url else {
        tracing::info!("Using in-memory store");
        return Ok(Stores {
            urls: Arc::new(MemoryUrlStore::new()),
            clicks: Arc::new(MemoryClickStore::new()),
        });
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    let pool = Arc::new(pool);
    let store = PgUrlStore::new(pool.clone());
    store
        .migrate()
        .await
        .context("Failed to apply migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Stores {
        urls: Arc::new(store),
        clicks: Arc::new(PgClickStore::new(pool)),
    })
}

/// Assembles the shared application state around `stores`.
///
/// Starts the limiter sweeps and the click worker, so it must be called within a
/// tokio runtime.
pub fn build_state(config: &Config, stores: Stores, clock: Arc<dyn Clock>) -> AppState {
    let link_service = LinkService::new(stores.urls, config.allocation_settings(), clock.clone());
    let stats_service = StatsService::start(stores.clicks, config.click_queue_capacity);

    let admission = AdmissionService::start(
        config.redirect_limit.clone(),
        config.allocation_quota.clone(),
        clock,
    );

    let auth_service = AuthService::new(
        config.api_keys.iter().cloned(),
        config.token_signing_secret.clone(),
    );

    AppState {
        link_service: Arc::new(link_service),
        admission: Arc::new(admission),
        stats_service: Arc::new(stats_service),
        auth_service: Arc::new(auth_service),
        base_url: Arc::from(config.base_url.trim_end_matches('/')),
        behind_proxy: config.behind_proxy,
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - URL store (PostgreSQL with migrations, or in-memory)
/// - Rate limiter registries and their sweeps
/// - Click worker, drained after the server stops
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let stores = connect_stores(&config).await?;
    let state = build_state(&config, stores, Arc::new(SystemClock));
    let admission = state.admission.clone();
    let stats = state.stats_service.clone();

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    admission.shutdown().await;
    stats.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
