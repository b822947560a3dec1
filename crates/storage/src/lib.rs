//! Durable asset storage behind a small object-store port.
//!
//! Generated stills and clips are uploaded here and addressed afterwards
//! only by their delivery URL. The S3 implementation is the production
//! backend; tests substitute an in-memory store.

pub mod error;
pub mod key;
pub mod s3;

pub use error::StorageError;
pub use key::AssetKey;
pub use s3::S3ObjectStore;

use async_trait::async_trait;

/// Port for durable asset uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an asset and return its stable delivery URL.
    async fn put(
        &self,
        key: &AssetKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}
