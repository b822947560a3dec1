//! Asset upload with independent retry.
//!
//! Upload failure after a successful generation is retried on its own;
//! the expensive generation call is never repeated just to redo an
//! upload.

use mascotly_core::failure::FailureKind;
use mascotly_core::retry::{retry, RetryConfig};
use mascotly_storage::{AssetKey, ObjectStore, StorageError};

pub async fn upload_with_retry(
    objects: &dyn ObjectStore,
    retry_config: &RetryConfig,
    key: &AssetKey,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, StorageError> {
    retry(
        retry_config,
        |e: &StorageError| e.kind() == FailureKind::Transient,
        |_attempt| {
            let bytes = bytes.clone();
            async move { objects.put(key, bytes, content_type).await }
        },
    )
    .await
}
