pub use super::files::Entity as Files;
pub use super::users::Entity as Users;
