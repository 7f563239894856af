use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::file::{FileRecord, NewFile, OwnerFileStats};
pub use repositories::user::{NewUser, ReassignOutcome, User};

use crate::config::SecurityConfig;
use crate::domain::Role;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn file_repo(&self) -> repositories::file::FileRepository {
        repositories::file::FileRepository::new(self.conn.clone())
    }

    // ========================================================================
    // User directory
    // ========================================================================

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        self.user_repo().list(role).await
    }

    pub async fn insert_user(&self, new: NewUser) -> Result<User> {
        self.user_repo().insert(new).await
    }

    pub async fn user_has_password(&self, user_id: i32) -> Result<bool> {
        self.user_repo().has_password(user_id).await
    }

    pub async fn verify_user_password(&self, user_id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(user_id, password).await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: Option<&SecurityConfig>,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, config)
            .await
    }

    pub async fn set_user_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        self.user_repo()
            .set_reset_token(user_id, token, expires_at)
            .await
    }

    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().find_by_reset_token(token).await
    }

    pub async fn update_user_last_login(&self, user_id: i32) -> Result<()> {
        self.user_repo().update_last_login(user_id).await
    }

    pub async fn set_user_role(&self, user_id: i32, role: Role) -> Result<Option<User>> {
        self.user_repo().set_role(user_id, role).await
    }

    pub async fn set_user_status(&self, user_id: i32, is_active: bool) -> Result<Option<User>> {
        self.user_repo().set_status(user_id, is_active).await
    }

    pub async fn set_user_credits(&self, user_id: i32, credits: i32) -> Result<Option<User>> {
        self.user_repo().set_credits(user_id, credits).await
    }

    pub async fn least_loaded_manager(&self) -> Result<Option<i32>> {
        self.user_repo().least_loaded_manager().await
    }

    pub async fn reassign_manager(
        &self,
        client_id: i32,
        new_manager_id: Option<i32>,
    ) -> Result<ReassignOutcome> {
        self.user_repo()
            .reassign_manager(client_id, new_manager_id)
            .await
    }

    pub async fn is_assigned_client(&self, client_id: i32, manager_id: i32) -> Result<bool> {
        self.user_repo()
            .is_assigned_client(client_id, manager_id)
            .await
    }

    // ========================================================================
    // File catalog
    // ========================================================================

    pub async fn insert_file(&self, new: NewFile) -> Result<FileRecord> {
        self.file_repo().insert(new).await
    }

    pub async fn get_file(&self, id: i32) -> Result<Option<FileRecord>> {
        self.file_repo().get(id).await
    }

    pub async fn list_files_owned_by(&self, owner_id: i32) -> Result<Vec<FileRecord>> {
        self.file_repo().list_owned_by(owner_id).await
    }

    pub async fn soft_delete_file(&self, id: i32) -> Result<bool> {
        self.file_repo().soft_delete(id).await
    }

    pub async fn update_file_description(
        &self,
        id: i32,
        description: Option<String>,
    ) -> Result<Option<FileRecord>> {
        self.file_repo().update_description(id, description).await
    }

    pub async fn file_stats_by_owner(&self) -> Result<Vec<OwnerFileStats>> {
        self.file_repo().stats_by_owner().await
    }
}
