//! Blob store client implementation.
//!
//! Talks to Google Cloud Storage through its S3-compatible XML API
//! using HMAC interoperability credentials, so the same client works
//! against any S3-compatible endpoint in tests and self-hosted
//! deployments.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Configuration for the blob store client.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    /// S3-compatible endpoint URL
    pub endpoint_url: String,
    /// HMAC access key
    pub access_key_id: String,
    /// HMAC secret
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (ignored by GCS, required by the SDK)
    pub region: String,
    /// Base URL for public object links
    pub public_base_url: String,
}

impl BlobStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let bucket_name = std::env::var("STORAGE_BUCKET")
            .map_err(|_| StorageError::config_error("STORAGE_BUCKET not set"))?;

        let public_base_url = std::env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "https://storage.googleapis.com".to_string());

        Ok(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL")
                .unwrap_or_else(|_| "https://storage.googleapis.com".to_string()),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            bucket_name,
            public_base_url,
        })
    }
}

/// Blob store client.
#[derive(Clone)]
pub struct BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl BlobStore {
    /// Create a new client from configuration.
    pub fn new(config: BlobStoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "blobstore",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(BlobStoreConfig::from_env()?))
    }

    /// Public, dereferenceable URL for a key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    /// Upload bytes and return the public URL.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(self.public_url(key))
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Sdk(format!("Bucket connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> BlobStore {
        BlobStore::new(BlobStoreConfig {
            endpoint_url: "https://storage.googleapis.com".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: "adreel-assets".to_string(),
            region: "auto".to_string(),
            public_base_url: "https://storage.googleapis.com".to_string(),
        })
    }

    #[test]
    fn public_url_includes_bucket_and_key() {
        let store = test_store();
        assert_eq!(
            store.public_url("previews/pv-1/bg.png"),
            "https://storage.googleapis.com/adreel-assets/previews/pv-1/bg.png"
        );
    }
}
