//! Domain service for user directory administration.
//!
//! Covers the staff-facing operations: listing and creating accounts,
//! role/status changes, the manager assignment engine, and the credit
//! ledger. Route-level allow-lists decide who may call each operation; this
//! service additionally enforces the rules that depend on the actor
//! (self-modification guards, manager creation limits).

use thiserror::Error;

use crate::db::User;
use crate::domain::{Principal, Role};

/// Errors specific to directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Reassignment target is not a client account.
    #[error("Target user is not a client")]
    InvalidTarget,

    /// Proposed manager does not hold a manager/admin role.
    #[error("Assigned manager must have role manager or admin")]
    InvalidRole,

    /// Proposed manager account is deactivated.
    #[error("Assigned manager is deactivated")]
    InactiveManager,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for DirectoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DirectoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for staff-created accounts (role is caller-chosen, unlike
/// self-service registration).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Domain service trait for the user directory.
#[async_trait::async_trait]
pub trait UserDirectoryService: Send + Sync {
    /// Lists accounts, optionally filtered by role, newest first.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, DirectoryError>;

    /// Creates an account with an explicit role.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Forbidden`] when a manager tries to create
    /// an admin or manager account.
    async fn create_user(
        &self,
        actor: &Principal,
        account: NewAccount,
    ) -> Result<User, DirectoryError>;

    /// Changes an account's role. Self-change is rejected unconditionally.
    async fn set_role(
        &self,
        actor: &Principal,
        target_id: i32,
        role: Role,
    ) -> Result<User, DirectoryError>;

    /// Activates or deactivates an account. Self-change is rejected
    /// unconditionally.
    async fn set_status(
        &self,
        actor: &Principal,
        target_id: i32,
        is_active: bool,
    ) -> Result<User, DirectoryError>;

    /// Replaces a client's manager assignment; `None` unassigns. Validation
    /// and update run in a single transaction.
    async fn reassign_manager(
        &self,
        client_id: i32,
        new_manager_id: Option<i32>,
    ) -> Result<User, DirectoryError>;

    /// Absolute replace of a user's credit balance.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Validation`] for negative values.
    async fn set_credits(&self, user_id: i32, credits: i32) -> Result<User, DirectoryError>;
}
