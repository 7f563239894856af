use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::require_role;
use super::{ApiError, ApiResponse, AppState, ClientFilesDto, FileDto, MessageResponse, UserDto};
use crate::constants::limits::MAX_FILES_PER_UPLOAD;
use crate::domain::{Principal, Role};
use crate::services::{FailedUpload, UploadPart};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct UploadManyResponse {
    pub uploaded: Vec<FileDto>,
    pub failed: Vec<FailedUpload>,
}

#[derive(Serialize)]
pub struct UserFilesResponse {
    pub user: UserDto,
    pub files: Vec<FileDto>,
}

#[derive(Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: Option<String>,
}

/// Buffers the file parts bound to `field_name` plus the optional
/// `description` field out of a multipart body. Parts under any other name
/// are ignored.
async fn collect_parts(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<(Vec<UploadPart>, Option<String>), ApiError> {
    let mut parts = Vec::new();
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some(field_name) && field.file_name().is_some() {
            let original_name = field
                .file_name()
                .map(ToString::to_string)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ApiError::validation("File part is missing a filename"))?;

            // Browsers always send a part content type; fall back to a
            // filename-based guess for clients that do not.
            let mime_type = field.content_type().map_or_else(
                || {
                    mime_guess::from_path(&original_name)
                        .first_or_octet_stream()
                        .to_string()
                },
                ToString::to_string,
            );

            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read file part: {e}")))?;

            parts.push(UploadPart {
                original_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
        } else if field.name() == Some("description") {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read field: {e}")))?;
            if !text.is_empty() {
                description = Some(text);
            }
        }
    }

    Ok((parts, description))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /files/upload
/// Single-file upload bound to the `file` field; an optional `description`
/// field is stored with it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (mut parts, description) = collect_parts(multipart, "file").await?;

    if parts.is_empty() {
        return Err(ApiError::validation("No file provided"));
    }
    if parts.len() > 1 {
        return Err(ApiError::validation(
            "Only one file is accepted here; use the multi-upload endpoint",
        ));
    }

    let file = state
        .file_service()
        .upload(&principal, parts.remove(0), description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(FileDto::from(file))),
    ))
}

/// POST /files/upload-multiple
/// Batch upload bound to the `files` field; per-file failures are reported
/// without failing the batch.
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (parts, _) = collect_parts(multipart, "files").await?;

    if parts.is_empty() {
        return Err(ApiError::validation("No files provided"));
    }
    if parts.len() > MAX_FILES_PER_UPLOAD {
        return Err(ApiError::validation(format!(
            "At most {MAX_FILES_PER_UPLOAD} files per upload"
        )));
    }

    let (uploaded, failed) = state.file_service().upload_many(&principal, parts).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UploadManyResponse {
            uploaded: uploaded.into_iter().map(FileDto::from).collect(),
            failed,
        })),
    ))
}

/// GET /files/mine
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<FileDto>>>, ApiError> {
    let files = state.file_service().list_mine(&principal).await?;

    Ok(Json(ApiResponse::success(
        files.into_iter().map(FileDto::from).collect(),
    )))
}

/// GET /files/user/{id}
/// Another account's files (admin, manager, editor); the decision engine
/// narrows managers down to their assigned clients.
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserFilesResponse>>, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager, Role::Editor])?;

    let (user, files) = state
        .file_service()
        .list_for_user(&principal, user_id)
        .await?;

    Ok(Json(ApiResponse::success(UserFilesResponse {
        user: UserDto::from(user),
        files: files.into_iter().map(FileDto::from).collect(),
    })))
}

/// GET /files/clients
/// Client accounts with upload statistics (admin, manager, editor; managers
/// see only their assigned clients)
pub async fn clients_overview(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<ClientFilesDto>>>, ApiError> {
    require_role(&principal, &[Role::Admin, Role::Manager, Role::Editor])?;

    let entries = state.file_service().clients_overview(&principal).await?;

    Ok(Json(ApiResponse::success(
        entries.into_iter().map(ClientFilesDto::from).collect(),
    )))
}

/// GET /files/{id}/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(file_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let (record, bytes) = state.file_service().download(&principal, file_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        record
            .mime_type
            .parse()
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    // Quotes and control characters would break the header value.
    let safe_name: String = record
        .original_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{safe_name}\"")
            .parse()
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((headers, bytes))
}

/// GET /files/{id}
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(file_id): Path<i32>,
) -> Result<Json<ApiResponse<FileDto>>, ApiError> {
    let record = state.file_service().get_info(&principal, file_id).await?;

    Ok(Json(ApiResponse::success(FileDto::from(record))))
}

/// PUT /files/{id}
/// Owner-only description edit; `null` clears it.
pub async fn update_description(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(file_id): Path<i32>,
    Json(payload): Json<UpdateDescriptionRequest>,
) -> Result<Json<ApiResponse<FileDto>>, ApiError> {
    let record = state
        .file_service()
        .update_description(&principal, file_id, payload.description)
        .await?;

    Ok(Json(ApiResponse::success(FileDto::from(record))))
}

/// DELETE /files/{id}
/// Owner-or-admin soft delete.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    principal: axum::Extension<Principal>,
    Path(file_id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.file_service().delete(&principal, file_id).await?;

    tracing::info!("File {} deleted by user {}", file_id, principal.id);

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "File deleted",
    ))))
}
