//! Access decision engine.
//!
//! `can_access` answers "may this actor touch resources owned by that user?"
//! without consulting the database. The manager case cannot be decided from
//! role alone, so it returns [`AccessDecision::AllowIfManagerOf`] and the
//! caller must verify the assignment (`target.manager_id == actor.id`)
//! against the user directory; a failed check means Deny. Keeping the lookup
//! out of this module keeps the decision function pure.
//!
//! Mutations do not go through `can_access`: deleting a file is owner-or-admin,
//! editing its description is owner-only.

use crate::domain::role::Role;

/// Outcome of the role-based access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Provisional: allowed only if the given owner has the actor assigned
    /// as manager. The caller performs that existence check.
    AllowIfManagerOf(i32),
    Deny,
}

/// An authenticated actor, as resolved by the auth middleware.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
}

/// Role-based read access to resources owned by `target_owner_id`.
///
/// Evaluated in fixed priority order: self-access always wins, then admin,
/// then the deferred manager check, then the editor blanket grant. Clients
/// never reach another owner's resources.
#[must_use]
pub fn can_access(actor: &Principal, target_owner_id: i32) -> AccessDecision {
    if actor.id == target_owner_id {
        return AccessDecision::Allow;
    }

    match actor.role {
        Role::Admin => AccessDecision::Allow,
        Role::Manager => AccessDecision::AllowIfManagerOf(target_owner_id),
        // Editors process documents across clients and get blanket read access.
        Role::Editor => AccessDecision::Allow,
        Role::Client => AccessDecision::Deny,
    }
}

/// Only the owner or an admin may delete a file. Manager and editor read
/// access does not extend to mutation.
#[must_use]
pub fn can_delete_file(actor: &Principal, owner_id: i32) -> bool {
    actor.id == owner_id || actor.role == Role::Admin
}

/// Only the owner may edit file metadata. Admin does not bypass this one.
#[must_use]
pub const fn can_edit_file(actor: &Principal, owner_id: i32) -> bool {
    actor.id == owner_id
}
