//! `SeaORM` implementation of the `UserDirectoryService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password;
use crate::db::{NewUser, ReassignOutcome, Store};
use crate::db::User;
use crate::domain::{Principal, Role};
use crate::services::auth_service::{is_valid_email, validate_password};
use crate::services::user_service::{DirectoryError, NewAccount, UserDirectoryService};

pub struct SeaOrmUserDirectoryService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserDirectoryService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl UserDirectoryService for SeaOrmUserDirectoryService {
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DirectoryError> {
        Ok(self.store.list_users(role).await?)
    }

    async fn create_user(
        &self,
        actor: &Principal,
        account: NewAccount,
    ) -> Result<User, DirectoryError> {
        if account.name.trim().is_empty() {
            return Err(DirectoryError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&account.email) {
            return Err(DirectoryError::Validation(
                "Invalid email format".to_string(),
            ));
        }
        validate_password(&account.password)
            .map_err(|e| DirectoryError::Validation(e.to_string()))?;

        // Managers may only create editor and client accounts.
        if actor.role == Role::Manager && account.role.can_manage_clients() {
            return Err(DirectoryError::Forbidden(
                "Insufficient rights to create a user with this role".to_string(),
            ));
        }

        if self
            .store
            .get_user_by_email(&account.email)
            .await?
            .is_some()
        {
            return Err(DirectoryError::EmailTaken);
        }

        let password = account.password.clone();
        let config = self.security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| DirectoryError::Internal(format!("Hashing task panicked: {e}")))??;

        // Client accounts get a manager at creation, same as self-service
        // registration.
        let manager_id = if account.role == Role::Client {
            self.store.least_loaded_manager().await?
        } else {
            None
        };

        let user = self
            .store
            .insert_user(NewUser {
                name: account.name,
                email: account.email,
                phone: account.phone,
                password_hash: Some(password_hash),
                role: account.role,
                manager_id,
            })
            .await?;

        info!(
            "User {} created by {} with role {}",
            user.id, actor.id, user.role
        );

        Ok(user)
    }

    async fn set_role(
        &self,
        actor: &Principal,
        target_id: i32,
        role: Role,
    ) -> Result<User, DirectoryError> {
        if actor.id == target_id {
            return Err(DirectoryError::Validation(
                "Cannot change your own role".to_string(),
            ));
        }

        let user = self
            .store
            .set_user_role(target_id, role)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        info!("Role of user {} changed to {} by {}", target_id, role, actor.id);

        Ok(user)
    }

    async fn set_status(
        &self,
        actor: &Principal,
        target_id: i32,
        is_active: bool,
    ) -> Result<User, DirectoryError> {
        if actor.id == target_id {
            return Err(DirectoryError::Validation(
                "Cannot deactivate your own account".to_string(),
            ));
        }

        let user = self
            .store
            .set_user_status(target_id, is_active)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        info!(
            "Status of user {} set to {} by {}",
            target_id, is_active, actor.id
        );

        Ok(user)
    }

    async fn reassign_manager(
        &self,
        client_id: i32,
        new_manager_id: Option<i32>,
    ) -> Result<User, DirectoryError> {
        match self.store.reassign_manager(client_id, new_manager_id).await? {
            ReassignOutcome::Updated(user) => {
                info!(
                    "Manager of client {} set to {:?}",
                    client_id, new_manager_id
                );
                Ok(user)
            }
            ReassignOutcome::ClientNotFound | ReassignOutcome::ManagerNotFound => {
                Err(DirectoryError::NotFound)
            }
            ReassignOutcome::NotAClient => Err(DirectoryError::InvalidTarget),
            ReassignOutcome::ManagerInvalidRole => Err(DirectoryError::InvalidRole),
            ReassignOutcome::ManagerInactive => Err(DirectoryError::InactiveManager),
        }
    }

    async fn set_credits(&self, user_id: i32, credits: i32) -> Result<User, DirectoryError> {
        if credits < 0 {
            return Err(DirectoryError::Validation(
                "Credits must be a non-negative integer".to_string(),
            ));
        }

        let user = self
            .store
            .set_user_credits(user_id, credits)
            .await?
            .ok_or(DirectoryError::NotFound)?;

        info!("Credits of user {} set to {}", user_id, credits);

        Ok(user)
    }
}
