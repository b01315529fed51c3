use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, validation};
use crate::entities::accounts::Role;
use crate::token;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct RegisteredUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Identity decoded from the bearer token, attached to the request for
/// downstream handlers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i32,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Bearer-token gate. A missing or malformed `Authorization` header is
/// rejected with 403, a token that fails verification with 401 (matching the
/// contract the frontend was built against).
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::forbidden("No token provided or malformed"));
    };

    let auth_config = state.config().read().await.auth.clone();
    let claims = token::verify(&token, &auth_config)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

/// Role gate stacked on admin-only routes, after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized: No user info"))?;

    if !user.is_admin() {
        return Err(ApiError::forbidden("Access denied: insufficient role"));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.trim().to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let username = validation::require_field("Username", &payload.username)?;
    let email = validation::require_field("Email", &payload.email)?;
    validation::require_field("Password", &payload.password)?;
    validation::validate_email(email)?;

    let role = match payload.role.as_deref() {
        Some(role) if !role.is_empty() => validation::parse_role(role)?,
        _ => Role::User,
    };

    let security = state.config().read().await.security.clone();
    let account = state
        .store()
        .create_account(username, email, &payload.password, role, &security)
        .await?
        .ok_or_else(|| ApiError::validation("Username or email already exists"))?;

    tracing::info!("Registered account {} ({})", account.id, account.email);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RegisteredUser {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
        })),
    ))
}

/// POST /api/auth/login
/// The `username` field matches either the display name or the email.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let account = state
        .store()
        .verify_credentials(&payload.username, &payload.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let auth_config = state.config().read().await.auth.clone();
    let token = token::issue(account.id, account.role, &auth_config)?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        role: account.role,
        username: account.username,
        email: account.email,
    })))
}

/// GET /api/auth/me
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<super::AccountDto>>, ApiError> {
    let account = state
        .store()
        .get_account(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", user.id))?;

    Ok(Json(ApiResponse::success(account.into())))
}

/// PUT /api/auth/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
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
        return Err(ApiError::not_found("User", user.id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Profile updated successfully".to_string(),
    })))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::validation("Old and new password required"));
    }

    let is_valid = state
        .store()
        .verify_account_password(user.id, &payload.current_password)
        .await?;
    if !is_valid {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let security = state.config().read().await.security.clone();
    state
        .store()
        .update_account_password(user.id, &payload.new_password, &security)
        .await?;

    tracing::info!("Password changed for account {}", user.id);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password changed successfully".to_string(),
    })))
}
