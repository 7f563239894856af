use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{files, prelude::*};

/// File record as stored in the catalog. `path` points into the blob store
/// and must never leave the service layer.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: i32,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub owner_id: i32,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<files::Model> for FileRecord {
    fn from(model: files::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            original_name: model.original_name,
            mime_type: model.mime_type,
            size: model.size,
            path: model.path,
            owner_id: model.owner_id,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub owner_id: i32,
    pub description: Option<String>,
}

/// Per-owner upload statistics for the clients overview.
#[derive(Debug, Clone)]
pub struct OwnerFileStats {
    pub owner_id: i32,
    pub file_count: i64,
    pub last_upload: Option<String>,
}

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, new: NewFile) -> Result<FileRecord> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = files::ActiveModel {
            filename: Set(new.filename),
            original_name: Set(new.original_name),
            mime_type: Set(new.mime_type),
            size: Set(new.size),
            path: Set(new.path),
            owner_id: Set(new.owner_id),
            description: Set(new.description),
            is_deleted: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert file record")?;

        Ok(FileRecord::from(model))
    }

    /// Lookup by id. Soft-deleted records are invisible here, as everywhere
    /// else in the catalog.
    pub async fn get(&self, id: i32) -> Result<Option<FileRecord>> {
        let file = Files::find_by_id(id)
            .filter(files::Column::IsDeleted.eq(false))
            .one(&self.conn)
            .await
            .context("Failed to query file by ID")?;

        Ok(file.map(FileRecord::from))
    }

    /// Non-deleted files for an owner, newest first.
    pub async fn list_owned_by(&self, owner_id: i32) -> Result<Vec<FileRecord>> {
        let rows = Files::find()
            .filter(files::Column::OwnerId.eq(owner_id))
            .filter(files::Column::IsDeleted.eq(false))
            .order_by_desc(files::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list files by owner")?;

        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    /// Flip the soft-delete flag. Returns false when no live record matched,
    /// so a repeated delete surfaces as not-found rather than succeeding.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let result = Files::update_many()
            .col_expr(
                files::Column::IsDeleted,
                sea_orm::sea_query::Expr::value(true),
            )
            .col_expr(
                files::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(files::Column::Id.eq(id))
            .filter(files::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to soft-delete file")?;

        Ok(result.rows_affected > 0)
    }

    /// Returns `None` when the record does not exist or is deleted.
    pub async fn update_description(
        &self,
        id: i32,
        description: Option<String>,
    ) -> Result<Option<FileRecord>> {
        let Some(file) = Files::find_by_id(id)
            .filter(files::Column::IsDeleted.eq(false))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut active: files::ActiveModel = file.into();
        active.description = Set(description);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        Ok(Some(FileRecord::from(model)))
    }

    /// Upload statistics grouped by owner, deleted files excluded.
    pub async fn stats_by_owner(&self) -> Result<Vec<OwnerFileStats>> {
        let rows: Vec<(i32, i64, Option<String>)> = Files::find()
            .select_only()
            .column(files::Column::OwnerId)
            .column_as(files::Column::Id.count(), "file_count")
            .column_as(files::Column::CreatedAt.max(), "last_upload")
            .filter(files::Column::IsDeleted.eq(false))
            .group_by(files::Column::OwnerId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to aggregate file stats by owner")?;

        Ok(rows
            .into_iter()
            .map(|(owner_id, file_count, last_upload)| OwnerFileStats {
                owner_id,
                file_count,
                last_upload,
            })
            .collect())
    }
}
