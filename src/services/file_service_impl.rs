//! `SeaORM` implementation of the `FileService` trait.

use async_trait::async_trait;
use std::path::Path;
use tracing::{error, info};

use crate::constants::ALLOWED_MIME_TYPES;
use crate::db::{FileRecord, NewFile, Store};
use crate::domain::{
    AccessDecision, Principal, Role, can_access, can_delete_file, can_edit_file,
};
use crate::services::file_service::{
    ClientFiles, FailedUpload, FileError, FileService, UploadPart,
};
use crate::storage::BlobStore;

pub struct SeaOrmFileService {
    store: Store,
    blobs: BlobStore,
}

impl SeaOrmFileService {
    #[must_use]
    pub const fn new(store: Store, blobs: BlobStore) -> Self {
        Self { store, blobs }
    }

    /// Completes the two-phase access check: the pure decision first, then
    /// the manager-assignment lookup when the decision defers to it.
    async fn ensure_can_access(
        &self,
        actor: &Principal,
        owner_id: i32,
    ) -> Result<(), FileError> {
        match can_access(actor, owner_id) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::AllowIfManagerOf(target_owner) => {
                let assigned = self
                    .store
                    .is_assigned_client(target_owner, actor.id)
                    .await?;
                if assigned {
                    Ok(())
                } else {
                    Err(FileError::Forbidden(
                        "User is not your assigned client".to_string(),
                    ))
                }
            }
            AccessDecision::Deny => Err(FileError::Forbidden("Access denied".to_string())),
        }
    }

    async fn store_one(
        &self,
        actor: &Principal,
        part: UploadPart,
        description: Option<String>,
    ) -> Result<FileRecord, FileError> {
        if !ALLOWED_MIME_TYPES.contains(&part.mime_type.as_str()) {
            return Err(FileError::Validation(format!(
                "File type {} is not allowed",
                part.mime_type
            )));
        }

        let blob = self
            .blobs
            .save(actor.id, &part.original_name, &part.bytes)
            .await
            .map_err(|e| FileError::Storage(e.to_string()))?;

        let inserted = self
            .store
            .insert_file(NewFile {
                filename: blob.filename,
                original_name: part.original_name,
                mime_type: part.mime_type,
                size: blob.size,
                path: blob.path.to_string_lossy().into_owned(),
                owner_id: actor.id,
                description,
            })
            .await;

        match inserted {
            Ok(record) => {
                info!(
                    "File {} uploaded by user {} ({} bytes)",
                    record.id, actor.id, record.size
                );
                Ok(record)
            }
            Err(e) => {
                // Catalog write failed after the blob landed on disk;
                // reverse the blob write.
                self.blobs.remove(&blob.path).await;
                Err(FileError::Database(e.to_string()))
            }
        }
    }
}

/// Most recent upload first, names breaking ties; clients without uploads
/// come last, by name.
fn overview_order(a: &ClientFiles, b: &ClientFiles) -> std::cmp::Ordering {
    match (&b.last_upload, &a.last_upload) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.user.name.cmp(&b.user.name)),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => a.user.name.cmp(&b.user.name),
    }
}

#[async_trait]
impl FileService for SeaOrmFileService {
    async fn upload(
        &self,
        actor: &Principal,
        part: UploadPart,
        description: Option<String>,
    ) -> Result<FileRecord, FileError> {
        self.store_one(actor, part, description).await
    }

    async fn upload_many(
        &self,
        actor: &Principal,
        parts: Vec<UploadPart>,
    ) -> Result<(Vec<FileRecord>, Vec<FailedUpload>), FileError> {
        let mut uploaded = Vec::new();
        let mut failed = Vec::new();

        for part in parts {
            let name = part.original_name.clone();
            match self.store_one(actor, part, None).await {
                Ok(record) => uploaded.push(record),
                Err(e) => failed.push(FailedUpload {
                    name,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            "Multi-upload by user {}: {} succeeded, {} failed",
            actor.id,
            uploaded.len(),
            failed.len()
        );

        Ok((uploaded, failed))
    }

    async fn list_mine(&self, actor: &Principal) -> Result<Vec<FileRecord>, FileError> {
        Ok(self.store.list_files_owned_by(actor.id).await?)
    }

    async fn list_for_user(
        &self,
        actor: &Principal,
        target_user_id: i32,
    ) -> Result<(crate::db::User, Vec<FileRecord>), FileError> {
        self.ensure_can_access(actor, target_user_id).await?;

        let user = self
            .store
            .get_user(target_user_id)
            .await?
            .ok_or(FileError::UserNotFound)?;

        let files = self.store.list_files_owned_by(target_user_id).await?;

        info!(
            "Files of user {} listed by {} ({} files)",
            target_user_id,
            actor.id,
            files.len()
        );

        Ok((user, files))
    }

    async fn clients_overview(&self, actor: &Principal) -> Result<Vec<ClientFiles>, FileError> {
        let clients = self.store.list_users(Some(Role::Client)).await?;
        let stats = self.store.file_stats_by_owner().await?;

        let stat_for = |owner_id: i32| {
            stats
                .iter()
                .find(|s| s.owner_id == owner_id)
                .map(|s| (s.file_count, s.last_upload.clone()))
                .unwrap_or((0, None))
        };

        let mut overview = Vec::new();
        for client in clients {
            // Managers see only their assigned clients; admins and editors
            // see everyone.
            if actor.role == Role::Manager && client.manager_id != Some(actor.id) {
                continue;
            }

            let (file_count, last_upload) = stat_for(client.id);
            overview.push(ClientFiles {
                user: client,
                file_count,
                last_upload,
            });
        }

        overview.sort_by(overview_order);

        Ok(overview)
    }

    async fn get_info(&self, actor: &Principal, file_id: i32) -> Result<FileRecord, FileError> {
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        self.ensure_can_access(actor, file.owner_id).await?;

        Ok(file)
    }

    async fn download(
        &self,
        actor: &Principal,
        file_id: i32,
    ) -> Result<(FileRecord, Vec<u8>), FileError> {
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        self.ensure_can_access(actor, file.owner_id).await?;

        let bytes = self
            .blobs
            .read(Path::new(&file.path))
            .await
            .map_err(|e| FileError::Storage(e.to_string()))?;

        let Some(bytes) = bytes else {
            error!("File {} missing on disk at {:?}", file.id, file.path);
            return Err(FileError::NotFound);
        };

        info!("File {} downloaded by user {}", file.id, actor.id);

        Ok((file, bytes))
    }

    async fn update_description(
        &self,
        actor: &Principal,
        file_id: i32,
        description: Option<String>,
    ) -> Result<FileRecord, FileError> {
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        if !can_edit_file(actor, file.owner_id) {
            return Err(FileError::Forbidden(
                "Only the owner can update the file".to_string(),
            ));
        }

        self.store
            .update_file_description(file_id, description)
            .await?
            .ok_or(FileError::NotFound)
    }

    async fn delete(&self, actor: &Principal, file_id: i32) -> Result<(), FileError> {
        let file = self
            .store
            .get_file(file_id)
            .await?
            .ok_or(FileError::NotFound)?;

        if !can_delete_file(actor, file.owner_id) {
            return Err(FileError::Forbidden(
                "Only the owner or an admin can delete the file".to_string(),
            ));
        }

        // The record stays in place; only the flag flips. A concurrent
        // delete that lost the race surfaces as NotFound here.
        if !self.store.soft_delete_file(file_id).await? {
            return Err(FileError::NotFound);
        }

        info!(
            "File {} deleted by user {} (owner {})",
            file_id, actor.id, file.owner_id
        );

        Ok(())
    }
}
