//! Local blob store for uploaded documents.
//!
//! Blobs live under `<root>/<owner_id>/<uuid>.<ext>`; the catalog row keeps
//! the opaque path. The store knows nothing about authorization.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

/// A blob that has been written to disk.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub filename: String,
    pub path: PathBuf,
    pub size: i64,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write bytes for an owner under a fresh UUID filename, keeping the
    /// original extension.
    pub async fn save(
        &self,
        owner_id: i32,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob> {
        let owner_dir = self.root.join(owner_id.to_string());
        fs::create_dir_all(&owner_dir).await?;

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let filename = format!("{}{ext}", Uuid::new_v4());
        let path = owner_dir.join(&filename);

        fs::write(&path, bytes).await?;

        info!(
            "Stored blob {:?} for owner {} ({} bytes)",
            path,
            owner_id,
            bytes.len()
        );

        Ok(StoredBlob {
            filename,
            path,
            size: i64::try_from(bytes.len()).unwrap_or(i64::MAX),
        })
    }

    /// Compensating delete for a failed catalog write. Best-effort: a missing
    /// blob is logged, not propagated, since the caller is already on an
    /// error path.
    pub async fn remove(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => info!("Removed blob {:?}", path),
            Err(e) => warn!("Failed to remove blob {:?}: {}", path, e),
        }
    }

    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
