//! Domain service for the file catalog.
//!
//! Every read goes through the access decision engine; the manager branch of
//! the decision is completed here with the assignment lookup the pure
//! function defers. Mutations use the ownership rules instead (owner or
//! admin for delete, owner only for description edits).

use thiserror::Error;

use crate::db::FileRecord;
use crate::db::User;
use crate::domain::Principal;

/// Errors specific to file catalog operations.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sea_orm::DbErr> for FileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// One part of a multipart upload, already buffered.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Per-file failure in a multi-upload; successes are reported alongside.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FailedUpload {
    pub name: String,
    pub error: String,
}

/// A client together with upload statistics, for the staff overview.
#[derive(Debug, Clone)]
pub struct ClientFiles {
    pub user: User,
    pub file_count: i64,
    pub last_upload: Option<String>,
}

/// Domain service trait for file management.
#[async_trait::async_trait]
pub trait FileService: Send + Sync {
    /// Stores the blob and creates the catalog record. If the catalog write
    /// fails the blob is removed again, so no record ever points at a
    /// missing blob and no orphan blob survives a failed upload.
    async fn upload(
        &self,
        actor: &Principal,
        part: UploadPart,
        description: Option<String>,
    ) -> Result<FileRecord, FileError>;

    /// Uploads several parts; failures are collected per file, not fatal.
    async fn upload_many(
        &self,
        actor: &Principal,
        parts: Vec<UploadPart>,
    ) -> Result<(Vec<FileRecord>, Vec<FailedUpload>), FileError>;

    /// The actor's own non-deleted files, newest first.
    async fn list_mine(&self, actor: &Principal) -> Result<Vec<FileRecord>, FileError>;

    /// Another user's files, gated by the access decision engine.
    async fn list_for_user(
        &self,
        actor: &Principal,
        target_user_id: i32,
    ) -> Result<(User, Vec<FileRecord>), FileError>;

    /// Clients with file counts and last upload time; managers see only
    /// their assigned clients.
    async fn clients_overview(&self, actor: &Principal) -> Result<Vec<ClientFiles>, FileError>;

    /// Catalog record for a file, access-checked. The stored path stays
    /// internal.
    async fn get_info(&self, actor: &Principal, file_id: i32) -> Result<FileRecord, FileError>;

    /// Record plus blob contents for download.
    async fn download(
        &self,
        actor: &Principal,
        file_id: i32,
    ) -> Result<(FileRecord, Vec<u8>), FileError>;

    /// Owner-only description update.
    async fn update_description(
        &self,
        actor: &Principal,
        file_id: i32,
        description: Option<String>,
    ) -> Result<FileRecord, FileError>;

    /// Owner-or-admin soft delete. Deleting an already deleted file is
    /// `NotFound`, not a silent success.
    async fn delete(&self, actor: &Principal, file_id: i32) -> Result<(), FileError>;
}
