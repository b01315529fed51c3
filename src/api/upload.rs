use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, UploadDto, validation};
use crate::storage;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub filename: String,
    pub history_id: i32,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChartHistoryRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub x_axis: String,
    #[serde(default)]
    pub y_axis: String,
    #[serde(default)]
    pub chart_type: String,
    #[serde(default)]
    pub chart_download_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpdated {
    pub message: String,
    pub avatar_url: String,
}

struct UploadedFile {
    original_name: String,
    bytes: Vec<u8>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/upload/excel
/// Accepts one multipart `file` field with a spreadsheet extension, writes
/// it to disk and records a ledger entry with placeholder chart metadata.
pub async fn upload_excel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadAccepted>>, ApiError> {
    let allowed = state.config().read().await.storage.allowed_extensions.clone();

    let Some(file) = read_file_field(multipart, "file").await? else {
        return Err(ApiError::validation("Invalid file format"));
    };

    let extension = storage::extension_of(&file.original_name);
    if !extension.is_some_and(|ext| allowed.contains(&ext)) {
        return Err(ApiError::validation("Invalid file format"));
    }

    let existing = state
        .store()
        .find_upload_by_owner_and_name(user.id, &file.original_name)
        .await?;
    if existing.is_some() {
        return Err(ApiError::validation("You have already uploaded this file."));
    }

    let stored_name = state
        .storage()
        .save_upload(&file.original_name, &file.bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;

    // The unique index on (account_id, file_name) turns a raced duplicate
    // into `None` here rather than a 500.
    let record = state
        .store()
        .record_upload(user.id, &file.original_name, &stored_name)
        .await?
        .ok_or_else(|| ApiError::validation("You have already uploaded this file."))?;

    tracing::info!(
        "Account {} uploaded {} as {}",
        user.id,
        record.file_name,
        stored_name
    );

    Ok(Json(ApiResponse::success(UploadAccepted {
        filename: stored_name,
        history_id: record.id,
        message: "File uploaded & saved to history".to_string(),
    })))
}

/// POST /api/upload/updateChartHistory
/// Upserts the chart selection for the caller's (filename) ledger entry.
pub async fn update_chart_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateChartHistoryRequest>,
) -> Result<Json<ApiResponse<UploadDto>>, ApiError> {
    if payload.file_name.is_empty()
        || payload.x_axis.is_empty()
        || payload.y_axis.is_empty()
        || payload.chart_type.is_empty()
    {
        return Err(ApiError::validation("Missing required fields"));
    }

    let chart_type = validation::parse_chart_type(&payload.chart_type)?;

    let record = state
        .store()
        .upsert_chart_metadata(
            user.id,
            &payload.file_name,
            &payload.x_axis,
            &payload.y_axis,
            chart_type,
            payload.chart_download_url.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(ApiResponse::success(UploadDto::from(record))))
}

/// POST /api/upload/avatar
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<AvatarUpdated>>, ApiError> {
    let allowed = state.config().read().await.storage.avatar_extensions.clone();

    let Some(file) = read_file_field(multipart, "avatar").await? else {
        return Err(ApiError::validation("Invalid file format"));
    };

    let extension = storage::extension_of(&file.original_name);
    if !extension.is_some_and(|ext| allowed.contains(&ext)) {
        return Err(ApiError::validation("Invalid file format"));
    }

    let stored_name = state
        .storage()
        .save_avatar(&file.original_name, &file.bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store avatar: {e}")))?;

    let avatar_url = format!("/uploads/{}/{}", storage::AVATARS_SUBDIR, stored_name);

    let updated = state.store().set_account_avatar(user.id, &avatar_url).await?;
    if !updated {
        return Err(ApiError::not_found("User", user.id));
    }

    Ok(Json(ApiResponse::success(AvatarUpdated {
        message: "Avatar updated".to_string(),
        avatar_url,
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Pull the named file field out of a multipart body. Returns `None` when
/// the field is absent or carries no filename.
async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let Some(original_name) = field.file_name().map(str::to_owned) else {
            return Ok(None);
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        return Ok(Some(UploadedFile {
            original_name,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}
