//! Domain types for the authorization core.
//!
//! Pure logic only: the role model and the access decision engine. Nothing in
//! here touches the database; the deferred manager-assignment check is the
//! caller's job (see [`access::AccessDecision::AllowIfManagerOf`]).

pub mod access;
pub mod role;

pub use access::{AccessDecision, Principal, can_access, can_delete_file, can_edit_file};
pub use role::Role;
