use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::domain::{Principal, Role};
use crate::services::Registration;

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Returned directly because no mail delivery is wired up; a deployment
    /// with email would send the token instead of echoing it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Session authentication middleware. Resolves the session to a fresh user
/// row on every request so role and status changes take effect immediately:
/// no session or unknown user means 401, a deactivated account means 403.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    };

    let Some(user) = state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
    else {
        return Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    };

    if !user.is_active {
        return Ok((StatusCode::FORBIDDEN, "Account is deactivated").into_response());
    }

    tracing::Span::current().record("user_id", user.id);

    request.extensions_mut().insert(Principal {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        active: user.is_active,
    });

    Ok(next.run(request).await)
}

/// Per-operation role allow-list. Every protected operation names its set
/// explicitly; nothing is ever derived from role rank.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        tracing::warn!(
            "Access attempt without sufficient role: user {} ({}) needs one of {:?}",
            principal.id,
            principal.role,
            allowed
        );
        Err(ApiError::Forbidden("Insufficient role".to_string()))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Self-service registration; new accounts are clients and get a manager
/// auto-assigned when one exists.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_service()
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone: payload.phone,
        })
        .await?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current account (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user(principal.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::validation(
            "Current and new password are required",
        ));
    }

    state
        .auth_service()
        .change_password(
            principal.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// POST /auth/forgot-password
/// Answers identically for known and unknown emails.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let reset_token = state
        .auth_service()
        .request_password_reset(&payload.email)
        .await?;

    Ok(Json(ApiResponse::success(ForgotPasswordResponse {
        message: "If the email exists, instructions have been sent".to_string(),
        reset_token,
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::validation("Token and new password are required"));
    }

    state
        .auth_service()
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password has been reset",
    ))))
}
