use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod admin;
pub mod auth;
mod error;
pub mod history;
pub mod insights;
mod observability;
pub mod parse;
pub mod system;
mod types;
pub mod upload;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

/// Per-process request state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn storage(&self) -> &crate::storage::FileStorage {
        &self.shared.storage
    }

    #[must_use]
    pub fn insights(&self) -> Option<&Arc<crate::clients::insight::InsightClient>> {
        self.shared.insights.as_ref()
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle).await)
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());
    let admin_routes = create_admin_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .merge(admin_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(system::health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes any authenticated account may call.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_profile))
        .route("/auth/me", put(auth::update_profile))
        .route("/auth/change-password", put(auth::change_password))
        .route("/upload/excel", post(upload::upload_excel))
        .route("/upload/updateChartHistory", post(upload::update_chart_history))
        .route("/upload/avatar", post(upload::upload_avatar))
        .route("/data/parse/{filename}", get(parse::parse_spreadsheet))
        .route("/history", get(history::get_my_history))
        .route("/history/user/{id}", get(history::get_history_for_user))
        .route("/history/stats", get(history::get_my_stats))
        .route("/history/details/{id}", get(history::get_history_details))
        .route("/history/{id}", delete(history::delete_history))
        .route("/history/download/{filename}", get(history::download_file))
        .route("/ai/insights", post(insights::generate_insights))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

/// Admin-only routes: the role gate stacks on top of the bearer-token gate,
/// so a valid non-admin token gets 403 and a bad token still gets 401.
fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/history/all", get(history::get_all_history))
        .route("/admin/stats", get(admin::get_stats))
        .route("/admin/users", get(admin::get_users))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route("/admin/users/{id}/block", patch(admin::toggle_block_user))
        .route("/admin/role/{id}", patch(admin::switch_role))
        .route("/admin/settings", put(admin::update_settings))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}
