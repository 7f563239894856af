use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod files;
mod observability;
mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

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
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn directory_service(&self) -> &Arc<dyn crate::services::UserDirectoryService> {
        &self.shared.directory_service
    }

    #[must_use]
    pub fn file_service(&self) -> &Arc<dyn crate::services::FileService> {
        &self.shared.file_service
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, idle_minutes, max_upload_bytes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_idle_minutes,
            config.storage.max_file_size_bytes(),
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(idle_minutes)));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/health", get(health))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(
            usize::try_from(max_upload_bytes).unwrap_or(usize::MAX),
        ))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}/role", put(users::set_role))
        .route("/users/{id}/status", put(users::set_status))
        .route("/users/{id}/manager", put(users::set_manager))
        .route("/users/{id}/credits", put(users::set_credits))
        .route("/files/upload", post(files::upload))
        .route("/files/upload-multiple", post(files::upload_multiple))
        .route("/files/mine", get(files::list_mine))
        .route("/files/clients", get(files::clients_overview))
        .route("/files/user/{id}", get(files::list_for_user))
        .route("/files/{id}/download", get(files::download))
        .route("/files/{id}", get(files::get_info))
        .route("/files/{id}", put(files::update_description))
        .route("/files/{id}", delete(files::delete_file))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
