use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, FileService, SeaOrmAuthService, SeaOrmFileService, SeaOrmUserDirectoryService,
    UserDirectoryService,
};
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub blobs: BlobStore,

    pub auth_service: Arc<dyn AuthService>,

    pub directory_service: Arc<dyn UserDirectoryService>,

    pub file_service: Arc<dyn FileService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let blobs = BlobStore::new(&config.storage.upload_path);
        blobs.ensure_exists().await?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let directory_service = Arc::new(SeaOrmUserDirectoryService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserDirectoryService>;

        let file_service = Arc::new(SeaOrmFileService::new(store.clone(), blobs.clone()))
            as Arc<dyn FileService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            blobs,
            auth_service,
            directory_service,
            file_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
