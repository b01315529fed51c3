use axum::Json;
use serde::Serialize;

use super::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: String,
}

/// GET /api/health — unauthenticated liveness probe.
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "OK",
        time: chrono::Utc::now().to_rfc3339(),
    }))
}
