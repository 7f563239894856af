use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::entities::{prelude::*, users};

/// User record returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub manager_id: Option<i32>,
    pub credits: i32,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        let role = Role::parse(&model.role)
            .with_context(|| format!("Unknown role '{}' for user {}", model.role, model.id))?;

        Ok(Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role,
            is_active: model.is_active,
            manager_id: model.manager_id,
            credits: model.credits,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Fields for inserting a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub manager_id: Option<i32>,
}

/// Result of a transactional manager reassignment. Validation failures are
/// data, not store errors, so callers can map them onto the domain taxonomy.
#[derive(Debug)]
pub enum ReassignOutcome {
    Updated(User),
    ClientNotFound,
    NotAClient,
    ManagerNotFound,
    ManagerInvalidRole,
    ManagerInactive,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    /// Email lookup, case-insensitive (emails are stored lowercase).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(User::try_from).transpose()
    }

    /// Optional role filter, newest accounts first.
    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut query = Users::find();

        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }

        let rows = query
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter().map(User::try_from).collect()
    }

    pub async fn insert(&self, new: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = users::ActiveModel {
            name: Set(new.name),
            email: Set(new.email.to_lowercase()),
            phone: Set(new.phone),
            password_hash: Set(new.password_hash),
            role: Set(new.role.as_str().to_string()),
            is_active: Set(true),
            manager_id: Set(new.manager_id),
            credits: Set(crate::constants::accounts::DEFAULT_CREDITS),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        User::try_from(model)
    }

    /// Whether the account has a password hash at all. Accounts created
    /// without one must go through password recovery first.
    pub async fn has_password(&self, user_id: i32) -> Result<bool> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password presence")?;

        Ok(user.is_some_and(|u| u.password_hash.is_some()))
    }

    /// Verify a password against the stored hash. A missing hash counts as a
    /// failed verification, not an error.
    /// Note: Argon2 verification is CPU-intensive and runs in `spawn_blocking`
    /// to avoid stalling the async runtime.
    pub async fn verify_password(&self, user_id: i32, password: &str) -> Result<bool> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(hash) = user.and_then(|u| u.password_hash) else {
            return Ok(false);
        };

        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Hash and store a new password, clearing any pending reset token.
    pub async fn update_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: Option<&SecurityConfig>,
    ) -> Result<()> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let password = new_password.to_string();
        let config = config.cloned();
        let new_hash = task::spawn_blocking(move || hash_password(&password, config.as_ref()))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(new_hash));
        active.password_reset_token = Set(None);
        active.password_reset_expires = Set(None);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Store a reset token pair, superseding any previous one.
    pub async fn set_reset_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let user = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(Some(token.to_string()));
        active.password_reset_expires = Set(Some(expires_at.to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Find the user holding an unexpired reset token.
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::PasswordResetToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let unexpired = user
            .password_reset_expires
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .is_some_and(|exp| exp > chrono::Utc::now());

        if !unexpired {
            return Ok(None);
        }

        User::try_from(user).map(Some)
    }

    pub async fn update_last_login(&self, user_id: i32) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::LastLogin,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to update last login")?;

        Ok(())
    }

    /// Returns `None` when the user does not exist.
    pub async fn set_role(&self, user_id: i32, role: Role) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(user_id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        User::try_from(model).map(Some)
    }

    /// Returns `None` when the user does not exist.
    pub async fn set_status(&self, user_id: i32, is_active: bool) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(user_id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        User::try_from(model).map(Some)
    }

    /// Absolute replace of the credit balance. Returns `None` when the user
    /// does not exist. Concurrent writers race with last-write-wins.
    pub async fn set_credits(&self, user_id: i32, credits: i32) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(user_id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.credits = Set(credits);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&self.conn).await?;

        User::try_from(model).map(Some)
    }

    /// The auto-assignment candidate: among active managers/admins, the one
    /// with the fewest assigned clients, ties broken by earliest account
    /// creation. `None` when the directory has no eligible account.
    pub async fn least_loaded_manager(&self) -> Result<Option<i32>> {
        let candidates = Users::find()
            .filter(users::Column::IsActive.eq(true))
            .filter(users::Column::Role.is_in([Role::Manager.as_str(), Role::Admin.as_str()]))
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query manager candidates")?;

        if candidates.is_empty() {
            return Ok(None);
        }

        let counts: Vec<(Option<i32>, i64)> = Users::find()
            .select_only()
            .column(users::Column::ManagerId)
            .column_as(users::Column::Id.count(), "client_count")
            .filter(users::Column::Role.eq(Role::Client.as_str()))
            .filter(users::Column::ManagerId.is_not_null())
            .group_by(users::Column::ManagerId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count clients per manager")?;

        let count_for = |id: i32| -> i64 {
            counts
                .iter()
                .find(|(manager_id, _)| *manager_id == Some(id))
                .map_or(0, |(_, count)| *count)
        };

        // Candidates are ordered by created_at, so a strict < keeps the
        // earliest account on ties.
        let mut best: Option<(i32, i64)> = None;
        for candidate in candidates {
            let load = count_for(candidate.id);
            if best.is_none_or(|(_, best_load)| load < best_load) {
                best = Some((candidate.id, load));
            }
        }

        Ok(best.map(|(id, _)| id))
    }

    /// Validate and replace a client's manager assignment in one transaction,
    /// closing the gap between checking the target's role/status and
    /// committing the update.
    pub async fn reassign_manager(
        &self,
        client_id: i32,
        new_manager_id: Option<i32>,
    ) -> Result<ReassignOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin reassignment transaction")?;

        let Some(client) = Users::find_by_id(client_id).one(&txn).await? else {
            return Ok(ReassignOutcome::ClientNotFound);
        };

        if Role::parse(&client.role) != Some(Role::Client) {
            return Ok(ReassignOutcome::NotAClient);
        }

        if let Some(manager_id) = new_manager_id {
            let Some(manager) = Users::find_by_id(manager_id).one(&txn).await? else {
                return Ok(ReassignOutcome::ManagerNotFound);
            };

            match Role::parse(&manager.role) {
                Some(role) if role.can_manage_clients() => {}
                _ => return Ok(ReassignOutcome::ManagerInvalidRole),
            }

            if !manager.is_active {
                return Ok(ReassignOutcome::ManagerInactive);
            }
        }

        let mut active: users::ActiveModel = client.into();
        active.manager_id = Set(new_manager_id);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&txn).await?;

        txn.commit()
            .await
            .context("Failed to commit reassignment transaction")?;

        Ok(ReassignOutcome::Updated(User::try_from(model)?))
    }

    /// The deferred half of the manager access decision: does this client
    /// currently have the manager assigned?
    pub async fn is_assigned_client(&self, client_id: i32, manager_id: i32) -> Result<bool> {
        let found = Users::find()
            .filter(users::Column::Id.eq(client_id))
            .filter(users::Column::ManagerId.eq(manager_id))
            .one(&self.conn)
            .await
            .context("Failed to check manager assignment")?;

        Ok(found.is_some())
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random password-reset token (64 character hex string)
#[must_use]
pub fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
