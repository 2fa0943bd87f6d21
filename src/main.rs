use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use stash_core::config::{
    max_upload_bytes_from_env_value, rest_addr_from_env_value, upload_dir_from_env_value,
};
use stash_core::{CoreConfig, MAX_UPLOAD_BYTES_ENV, REST_ADDR_ENV, UPLOAD_DIR_ENV};

/// Main entry point for the Stash upload service
///
/// Resolves configuration, ensures the storage root exists and serves the REST API until
/// interrupted.
///
/// # Environment Variables
/// - `STASH_REST_ADDR`: REST server address (default: "0.0.0.0:8080")
/// - `STASH_UPLOAD_DIR`: Storage root (default: "<system temp dir>/uploads")
/// - `STASH_MAX_UPLOAD_BYTES`: Upload body limit in bytes (default: 100 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the storage root cannot be created (fatal: nothing can be stored without it),
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stash_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("stash_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::new(
        upload_dir_from_env_value(std::env::var(UPLOAD_DIR_ENV).ok()),
        rest_addr_from_env_value(std::env::var(REST_ADDR_ENV).ok())?,
        max_upload_bytes_from_env_value(std::env::var(MAX_UPLOAD_BYTES_ENV).ok())?,
    )?);

    let store = cfg.open_store().map_err(|e| {
        tracing::error!("Storage root unavailable: {}", e);
        e
    })?;

    let addr = cfg.rest_addr();
    let app = api_rest::router(AppState::new(cfg, store));

    tracing::info!("++ Starting Stash REST on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum_serve(listener, app).await?;

    tracing::info!("-- Stash REST stopped");
    Ok(())
}

async fn axum_serve(listener: tokio::net::TcpListener, app: axum::Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}
