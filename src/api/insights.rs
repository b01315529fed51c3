use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::clients::insight::InsightClient;

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub headers: Option<Vec<String>>,
    pub rows: Option<Vec<Vec<Value>>>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insight: String,
}

/// POST /api/ai/insights
///
/// Proxies a column list plus a sample of rows to the configured
/// text-generation API and returns its summary verbatim.
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InsightsRequest>,
) -> Result<Json<ApiResponse<InsightsResponse>>, ApiError> {
    let (Some(headers), Some(rows)) = (payload.headers, payload.rows) else {
        return Err(ApiError::validation("Headers and rows required"));
    };

    let Some(client) = state.insights() else {
        return Err(ApiError::internal("AI insights are not enabled"));
    };

    let sample_rows = state.config().read().await.ai.sample_rows;
    let sample = &rows[..rows.len().min(sample_rows)];

    let prompt = InsightClient::build_prompt(&headers, sample);

    let insight = client.generate(&prompt).await.map_err(|e| {
        tracing::error!("Inference API error: {e:#}");
        ApiError::internal("Failed to generate AI insights")
    })?;

    Ok(Json(ApiResponse::success(InsightsResponse { insight })))
}
