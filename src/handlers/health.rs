//! Liveness and store health

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use crate::handlers::{ApiResponse, ApiResult};
use crate::state::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub name: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> ApiResult<Json<ApiResponse<HealthStatus>>> {
    ctx.services.health_check().await?;
    Ok(ApiResponse::ok(
        "OK",
        HealthStatus {
            name: crate::NAME,
            version: crate::VERSION,
        },
    ))
}
