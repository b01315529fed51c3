use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UploadDto};
use crate::entities::upload_history::ChartType;
use crate::storage;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartStat {
    pub chart_type: ChartType,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartStatsResponse {
    pub chart_stats: Vec<ChartStat>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/history — the caller's upload records, newest first.
pub async fn get_my_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UploadDto>>>, ApiError> {
    let rows = state.store().list_uploads_for_account(user.id).await?;
    let dtos = rows
        .into_iter()
        .map(|(record, owner)| UploadDto::from_record(record, owner))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /api/history/all — every account's records (admin only, enforced by
/// the router's role gate).
pub async fn get_all_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UploadDto>>>, ApiError> {
    let rows = state.store().list_all_uploads().await?;
    let dtos = rows
        .into_iter()
        .map(|(record, owner)| UploadDto::from_record(record, owner))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /api/history/user/{id} — records of one account; admins may look at
/// anyone, everyone else only at themselves.
pub async fn get_history_for_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<UploadDto>>>, ApiError> {
    if !user.is_admin() && account_id != user.id {
        return Err(ApiError::forbidden("Forbidden"));
    }

    let rows = state.store().list_uploads_for_account(account_id).await?;
    let dtos = rows
        .into_iter()
        .map(|(record, owner)| UploadDto::from_record(record, owner))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /api/history/stats — the caller's upload counts grouped by chart type.
pub async fn get_my_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ChartStatsResponse>>, ApiError> {
    let grouped = state
        .store()
        .count_uploads_by_chart_type_for_account(user.id)
        .await?;

    let chart_stats = grouped
        .into_iter()
        .map(|(chart_type, count)| ChartStat { chart_type, count })
        .collect();

    Ok(Json(ApiResponse::success(ChartStatsResponse { chart_stats })))
}

/// GET /api/history/details/{id}
pub async fn get_history_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UploadDto>>, ApiError> {
    let (record, owner) = state
        .store()
        .get_upload_with_owner(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("History not found".to_string()))?;

    if !user.is_admin() && record.account_id != user.id {
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(Json(ApiResponse::success(UploadDto::from_record(
        record, owner,
    ))))
}

/// DELETE /api/history/{id} — owner or admin. Deleting a record has no
/// cascade effects anywhere else.
pub async fn delete_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (record, _) = state
        .store()
        .get_upload_with_owner(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Upload not found".to_string()))?;

    if !user.is_admin() && record.account_id != user.id {
        return Err(ApiError::forbidden("Forbidden"));
    }

    state.store().remove_upload(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Upload history deleted".to_string(),
    })))
}

/// GET /api/history/download/{filename} — stream the stored bytes back as
/// an attachment. Accepts either the caller's original filename or the
/// stored on-disk name.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let Some(name) = storage::sanitize_filename(&filename) else {
        return Err(ApiError::validation("Invalid filename"));
    };

    let stored_name = match state
        .store()
        .find_upload_by_owner_and_name(user.id, name)
        .await?
    {
        Some(record) => record.stored_name.unwrap_or_else(|| name.to_string()),
        None => name.to_string(),
    };

    let path = state
        .storage()
        .resolve(&stored_name)
        .ok_or_else(|| ApiError::validation("Invalid filename"))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound("File not found".to_string()))?;

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{stored_name}\"");

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_str(content_type.as_ref())
                    .unwrap_or(HeaderValue::from_static("application/octet-stream")),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .unwrap_or(HeaderValue::from_static("attachment")),
            ),
        ],
        bytes,
    )
        .into_response())
}
