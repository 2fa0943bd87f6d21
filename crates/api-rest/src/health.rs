use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

impl HealthRes {
    pub fn alive() -> Self {
        Self {
            ok: true,
            message: "Stash REST API is alive".into(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes::alive())
}
