//! Storage error types.

use mascotly_core::failure::FailureKind;

/// Errors from the object store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The upload failed at the transport or service level.
    #[error("upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    /// The store configuration is unusable (bad bucket, bad URL base).
    #[error("storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Uploads are retried; configuration problems are not.
    pub fn kind(&self) -> FailureKind {
        match self {
            StorageError::Upload { .. } => FailureKind::Transient,
            StorageError::Config(_) => FailureKind::Permanent,
        }
    }
}
