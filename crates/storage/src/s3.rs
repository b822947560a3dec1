//! S3-backed object store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::StorageError;
use crate::key::AssetKey;
use crate::ObjectStore;

/// Object store writing to a single S3 bucket.
///
/// Delivery URLs are formed from a public base URL (CDN or bucket
/// website endpoint) rather than presigned, since generated assets are
/// served publicly.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a store from the ambient AWS environment configuration.
    pub async fn from_env(bucket: String, public_base_url: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket, public_base_url)
    }

    fn delivery_url(&self, key: &AssetKey) -> String {
        format!("{}/{}", self.public_base_url, key.as_string())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &AssetKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let object_key = key.as_string();
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: object_key.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(key = %object_key, size, "uploaded asset");
        Ok(self.delivery_url(key))
    }
}
