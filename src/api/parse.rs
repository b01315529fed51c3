use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tokio::task;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::sheet::{self, SheetData};
use crate::storage;

/// GET /api/data/parse/{filename}
///
/// The filename may be either the original name recorded in the caller's
/// ledger or the stored (timestamp-prefixed) on-disk name. The first sheet
/// is returned as a header row plus data rows.
pub async fn parse_spreadsheet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(filename): Path<String>,
) -> Result<Json<ApiResponse<SheetData>>, ApiError> {
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

    // calamine is synchronous; parse off the async runtime.
    let data = task::spawn_blocking(move || sheet::parse_first_sheet(&path))
        .await
        .map_err(|e| ApiError::internal(format!("Parse task panicked: {e}")))?
        .map_err(|e| {
            tracing::warn!("Spreadsheet parse failed: {e:#}");
            ApiError::internal("Failed to parse spreadsheet file")
        })?;

    Ok(Json(ApiResponse::success(data)))
}
