//! Job Portal Server Library
//!
//! REST backend for job seekers and hiring companies: registration, token
//! auth, job postings and applications.

pub mod core;
pub mod handlers;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::{AppState, PortalConfig};

/// Build the full application with its HTTP layers
pub fn app(state: AppState) -> axum::Router {
    core::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        // Already set, ignore
    }

    info!("=== Job Portal Server ===");

    let config = PortalConfig::from_env()?;
    let addr = config.bind_addr;

    info!("Database: {}", config.database_url);
    info!("Media directory: {:?}", config.media_dir);

    let state = AppState::new(config).await?;
    let store = state.store.clone();
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
