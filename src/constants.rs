/// MIME types accepted by the upload endpoints. Anything else is rejected
/// before the blob is written.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
    "application/rtf",
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/tiff",
    // Archives
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

pub mod accounts {
    /// Credit balance granted to every new account.
    pub const DEFAULT_CREDITS: i32 = 10;

    pub const MIN_PASSWORD_LENGTH: usize = 6;
}

pub mod limits {
    /// Upper bound on files per multi-upload request.
    pub const MAX_FILES_PER_UPLOAD: usize = 10;
}
