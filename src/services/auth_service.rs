//! Domain service for account authentication.
//!
//! Handles registration, login, password changes, and the password-reset
//! token flow. Role/status administration lives in the user directory
//! service.

use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("No password set. Use password recovery")]
    PasswordNotSet,

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for self-service registration. The role is always `client`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a client account, auto-assigning the least-loaded manager when
    /// one exists.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] for duplicate emails and
    /// [`AuthError::Validation`] for malformed input.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Verifies credentials and returns the account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on unknown email or wrong
    /// password (indistinguishable on purpose), and
    /// [`AuthError::AccountDeactivated`] for inactive accounts.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Creates a password-reset token for the account, superseding any
    /// previous one. Returns `None` when the email is unknown; the HTTP
    /// layer answers identically either way.
    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError>;

    /// Consumes a reset token and sets the new password.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Changes a user's password after verifying the current one.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

/// Password policy shared by every path that sets a password.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < crate::constants::accounts::MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            crate::constants::accounts::MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Minimal shape check; real deliverability is not this service's problem.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, rest)) = email.split_once('@') else {
        return false;
    };
    let Some((domain, tld)) = rest.rsplit_once('.') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !tld.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !rest.contains('@')
}
