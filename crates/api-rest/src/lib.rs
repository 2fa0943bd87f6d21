//! # API REST
//!
//! REST API implementation for Stash.
//!
//! Handles:
//! - HTTP endpoints with axum (upload, download, JSON/form echo, health)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart parsing, streaming bodies, status mapping, CORS)
//!
//! Uses `stash-files` for storage and `stash-core` for startup configuration.

#![warn(rust_2018_idioms)]

mod data;
pub mod error;
mod files;
mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use stash_core::CoreConfig;
use stash_files::BlobStore;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ErrorRes};
pub use files::UploadRes;
pub use health::HealthRes;

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    store: BlobStore,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: BlobStore) -> Self {
        Self { cfg, store }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        files::upload_file,
        files::download_file,
        data::submit_json,
        data::submit_form,
    ),
    components(schemas(HealthRes, UploadRes, ErrorRes, files::UploadForm))
)]
pub struct ApiDoc;

/// Builds the REST router
///
/// Upload bodies are limited to the configured maximum; every other route keeps axum's
/// default limit.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.cfg.max_upload_bytes();

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/files/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/files/download/*filename", get(files::download_file))
        .route("/api/data/submitJson", post(data::submit_json))
        .route("/api/data/submitForm", post(data::submit_form))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
