use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{AccountDto, ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::entities::accounts::AccountStatus;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub active_users: u64,
    pub blocked_users: u64,
    pub total_uploads: u64,
    pub chart_types: BTreeMap<String, i64>,
    pub most_used_chart: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleBlockRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BlockToggled {
    pub message: String,
    pub user: AccountDto,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRoleRequest {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminSettingsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SettingsUpdated {
    pub message: String,
    pub user: AccountDto,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/admin/stats — aggregate counts over accounts and the upload
/// ledger. The most-used chart type is the maximum of the grouped counts;
/// on a tie whichever grouped row the store yields first wins.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AdminStats>>, ApiError> {
    let store = state.store();

    let total_users = store.count_accounts().await?;
    let active_users = store.count_accounts_by_status(AccountStatus::Active).await?;
    let blocked_users = store
        .count_accounts_by_status(AccountStatus::Blocked)
        .await?;
    let total_uploads = store.count_uploads().await?;

    let grouped = store.count_uploads_by_chart_type().await?;

    let mut most_used: Option<(&'static str, i64)> = None;
    let mut chart_types = BTreeMap::new();
    for &(chart_type, count) in &grouped {
        chart_types.insert(chart_type.as_str().to_string(), count);
        if most_used.is_none_or(|(_, max)| count > max) {
            most_used = Some((chart_type.as_str(), count));
        }
    }

    Ok(Json(ApiResponse::success(AdminStats {
        total_users,
        active_users,
        blocked_users,
        total_uploads,
        chart_types,
        most_used_chart: most_used.map_or_else(|| "N/A".to_string(), |(label, _)| label.to_string()),
    })))
}

/// GET /api/admin/users — all accounts, password hashes never leave the
/// repository layer.
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state.store().list_accounts().await?;
    let dtos = accounts.into_iter().map(AccountDto::from).collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// DELETE /api/admin/users/{id} — the user's upload records are left in
/// place; nothing cascades.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let account = state.store().get_account(id).await?;
    if account.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    state.store().remove_account(id).await?;

    tracing::info!("Admin deleted account {id}");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}

/// PATCH /api/admin/users/{id}/block — flip the two-state active/blocked
/// flag. No other transitions exist.
pub async fn toggle_block_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleBlockRequest>,
) -> Result<Json<ApiResponse<BlockToggled>>, ApiError> {
    let status = validation::parse_status(&payload.status)?;

    let account = state
        .store()
        .set_account_status(id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(BlockToggled {
        message: format!("User {} successfully", payload.status),
        user: account.into(),
    })))
}

/// PATCH /api/admin/role/{id}
pub async fn switch_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SwitchRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let role = validation::parse_role(&payload.role)?;

    let updated = state.store().set_account_role(id, role).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Role updated to {}", payload.role),
    })))
}

/// PUT /api/admin/settings — updates the calling admin's own profile.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AdminSettingsRequest>,
) -> Result<Json<ApiResponse<SettingsUpdated>>, ApiError> {
    let username = validation::require_field("Username", &payload.username)?;
    let email = validation::require_field("Email", &payload.email)?;
    validation::validate_email(email)?;

    if state.store().email_in_use_by_other(email, user.id).await? {
        return Err(ApiError::validation("Email already in use"));
    }

    let updated = state
        .store()
        .update_account_profile(user.id, username, email)
        .await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let account = state
        .store()
        .get_account(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(SettingsUpdated {
        message: "Admin settings updated".to_string(),
        user: account.into(),
    })))
}
