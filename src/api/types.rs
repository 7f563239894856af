use serde::Serialize;

use crate::db::{FileRecord, User};
use crate::domain::Role;
use crate::services::ClientFiles;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub manager_id: Option<i32>,
    pub credits: i32,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            is_active: user.is_active,
            manager_id: user.manager_id,
            credits: user.credits,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Catalog record as exposed over HTTP. The blob path stays internal.
#[derive(Debug, Serialize)]
pub struct FileDto {
    pub id: i32,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub owner_id: i32,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FileRecord> for FileDto {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: file.size,
            owner_id: file.owner_id,
            description: file.description,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientFilesDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub file_count: i64,
    pub last_upload: Option<String>,
}

impl From<ClientFiles> for ClientFilesDto {
    fn from(entry: ClientFiles) -> Self {
        Self {
            id: entry.user.id,
            name: entry.user.name,
            email: entry.user.email,
            role: entry.user.role,
            file_count: entry.file_count,
            last_upload: entry.last_upload,
        }
    }
}
