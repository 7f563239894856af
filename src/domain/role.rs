//! Role model: a closed set of account roles.
//!
//! Every operation declares its own explicit allowed-role slice; the numeric
//! rank exists for display and sorting only and is never compared to derive
//! permissions.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Editor,
    Client,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Admin, Self::Manager, Self::Editor, Self::Client];

    /// Display rank. Not an authorization input.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Manager => 3,
            Self::Editor => 2,
            Self::Client => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Editor => "editor",
            Self::Client => "client",
        }
    }

    /// Parses the database/API representation. Returns `None` for anything
    /// outside the closed set so a misspelled role can never fall through.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "editor" => Some(Self::Editor),
            "client" => Some(Self::Client),
            _ => None,
        }
    }

    /// Roles that may carry client assignments.
    #[must_use]
    pub const fn can_manage_clients(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn parse_rejects_unknown_strings() {
        assert_eq!(Role::parse("superadmin"), None);
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn ranks_are_strictly_ordered() {
        assert_eq!(Role::Admin.rank(), 4);
        assert_eq!(Role::Manager.rank(), 3);
        assert_eq!(Role::Editor.rank(), 2);
        assert_eq!(Role::Client.rank(), 1);
    }

    #[test]
    fn only_managers_and_admins_manage_clients() {
        assert!(Role::Admin.can_manage_clients());
        assert!(Role::Manager.can_manage_clients());
        assert!(!Role::Editor.can_manage_clients());
        assert!(!Role::Client.can_manage_clients());
    }
}
