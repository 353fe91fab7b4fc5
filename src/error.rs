use thiserror::Error;

/// Closed set of failures surfaced by the leave subsystem. Handlers map
/// these onto HTTP statuses; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("leave dates overlap an existing approved request")]
    Overlap,

    #[error("leave quota is not sufficient for the requested period")]
    InsufficientQuota,

    #[error("leave request not found")]
    NotFound,

    #[error("failed to encrypt the deletion payload")]
    EncryptionFailed,

    #[error("encrypted payload is invalid or has been tampered with")]
    DecryptionFailed,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("file storage error: {0}")]
    File(#[from] std::io::Error),
}
