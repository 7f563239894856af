use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::require_role;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::domain::{Principal, Role};
use crate::services::NewAccount;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct SetManagerRequest {
    /// `null` (or absent) clears the assignment.
    pub manager_id: Option<i32>,
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::parse(raw).ok_or_else(|| {
        ApiError::validation(format!(
            "Invalid role '{raw}'. Allowed roles: admin, manager, editor, client"
        ))
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /users?role=
/// List accounts, optionally filtered by role (admin, manager)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager])?;

    let role = query.role.as_deref().map(parse_role).transpose()?;

    let users = state.directory_service().list_users(role).await?;

    tracing::info!(
        "User list requested by {} (filter: {:?})",
        principal.id,
        query.role
    );

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// POST /users
/// Create an account with an explicit role (admin, manager; managers may not
/// create admin/manager accounts)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager])?;

    let role = payload
        .role
        .as_deref()
        .map_or(Ok(Role::Client), parse_role)?;

    let user = state
        .directory_service()
        .create_user(
            &principal,
            NewAccount {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                phone: payload.phone,
                role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// PUT /users/{id}/role
/// Change an account's role (admin)
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(user_id): Path<i32>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_role(&principal, &[Role::Admin])?;

    let role = payload
        .get("role")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ApiError::validation("Field 'role' is required"))
        .and_then(parse_role)?;

    let user = state
        .directory_service()
        .set_role(&principal, user_id, role)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}/status
/// Activate or deactivate an account (admin)
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(user_id): Path<i32>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_role(&principal, &[Role::Admin])?;

    let is_active = payload
        .get("is_active")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| ApiError::validation("Field 'is_active' must be a boolean"))?;

    let user = state
        .directory_service()
        .set_status(&principal, user_id, is_active)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}/manager
/// Replace or clear a client's manager assignment (admin, manager)
pub async fn set_manager(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(user_id): Path<i32>,
    Json(payload): Json<SetManagerRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager])?;

    let user = state
        .directory_service()
        .reassign_manager(user_id, payload.manager_id)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}/credits
/// Absolute replace of the credit balance (admin, manager)
pub async fn set_credits(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(user_id): Path<i32>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager])?;

    // Manual check so a fractional or non-numeric value maps to 400, not a
    // generic deserialization rejection.
    let credits = payload
        .get("credits")
        .and_then(serde_json::Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| ApiError::validation("Credits must be a non-negative integer"))?;

    let user = state
        .directory_service()
        .set_credits(user_id, credits)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}
