pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Registration};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub use user_service::{DirectoryError, NewAccount, UserDirectoryService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserDirectoryService;

pub mod file_service;
pub use file_service::{ClientFiles, FailedUpload, FileError, FileService, UploadPart};

pub mod file_service_impl;
pub use file_service_impl::SeaOrmFileService;
