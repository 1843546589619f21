//! # forum-server
//!
//! Entry point: loads settings, initializes tracing, builds the configured
//! store and serves the HTTP API until SIGINT/SIGTERM.

#[cfg(not(feature = "web-axum"))]
compile_error!("forum-server is served over axum; enable the `web-axum` feature");

use std::sync::Arc;

use anyhow::Context;
use api_adapters::web::{self, AppState};
use api_adapters::Metrics;
use configs::{LoggingSettings, Settings, StoreBackend};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.logging);

    // 1. Storage
    let metrics = Arc::new(Metrics::new());
    let state = build_state(&settings, metrics).await?;

    // 2. HTTP
    let app = web::router(state);
    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, backend = ?settings.store.backend, "forum server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("forum server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn build_state(settings: &Settings, metrics: Arc<Metrics>) -> anyhow::Result<AppState> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("using the in-memory store, data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            Ok(AppState::from_store(store, metrics, settings.listing.default_limit))
        }
        StoreBackend::Postgres => postgres_state(settings, metrics).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn postgres_state(settings: &Settings, metrics: Arc<Metrics>) -> anyhow::Result<AppState> {
    use secrecy::ExposeSecret;
    use storage_adapters::PgStore;

    let database = &settings.database;
    let store = PgStore::connect(
        database.url.expose_secret(),
        database.max_connections,
        database.acquire_timeout(),
    )
    .await
    .context("failed to connect to postgres")?;
    if database.run_migrations {
        store.migrate().await?;
    }
    Ok(AppState::from_store(Arc::new(store), metrics, settings.listing.default_limit))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_state(_settings: &Settings, _metrics: Arc<Metrics>) -> anyhow::Result<AppState> {
    anyhow::bail!("built without the db-postgres feature; set FORUM__STORE__BACKEND=memory")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received ctrl-c, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
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
}
