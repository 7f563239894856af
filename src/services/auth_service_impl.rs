//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::{generate_reset_token, hash_password};
use crate::db::{NewUser, Store, User};
use crate::domain::Role;
use crate::services::auth_service::{
    AuthError, AuthService, Registration, is_valid_email, validate_password,
};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn hash_with_config(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let config = self.security.clone();

        let hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))??;

        Ok(hash)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if registration.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&registration.email) {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }
        validate_password(&registration.password)?;

        if self
            .store
            .get_user_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_with_config(&registration.password).await?;

        // Called exactly once, here, for new client accounts. Assignments are
        // never rebalanced automatically afterwards.
        let manager_id = self.store.least_loaded_manager().await?;

        let user = self
            .store
            .insert_user(NewUser {
                name: registration.name,
                email: registration.email,
                phone: registration.phone,
                password_hash: Some(password_hash),
                role: Role::Client,
                manager_id,
            })
            .await?;

        info!(
            "New user registered: {} (manager: {:?})",
            user.id, user.manager_id
        );

        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // Unknown email and wrong password answer identically.
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if !self.store.user_has_password(user.id).await? {
            return Err(AuthError::PasswordNotSet);
        }

        let is_valid = self.store.verify_user_password(user.id, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.update_user_last_login(user.id).await?;

        info!("Successful login: {} ({})", user.id, user.role);

        Ok(user)
    }

    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        let Some(user) = self.store.get_user_by_email(email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = generate_reset_token();
        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(i64::try_from(self.security.reset_token_ttl_seconds)
                .unwrap_or(3600));

        self.store
            .set_user_reset_token(user.id, &token, expires_at)
            .await?;

        info!("Password reset token created for user {}", user.id);

        Ok(Some(token))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let user = self
            .store
            .find_user_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        // update_user_password clears the token pair, so the token is
        // single-use.
        self.store
            .update_user_password(user.id, new_password, Some(&self.security))
            .await?;

        info!("Password reset completed for user {}", user.id);

        Ok(())
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let is_valid = self
            .store
            .verify_user_password(user_id, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, Some(&self.security))
            .await?;

        info!("Password changed for user {}", user_id);

        Ok(())
    }
}
