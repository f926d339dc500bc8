use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::{path::Path, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::config::StorageConfig;

/// Lifetime of a presigned gallery upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Object-key prefix for every gallery image.
pub const GALLERY_PREFIX: &str = "gallery";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("presigning config rejected: {0}")]
    Config(String),
    #[error("presigning failed: {0}")]
    Presign(String),
    #[error("bucket setup failed: {0}")]
    Bucket(String),
    #[error("simulated storage failure")]
    Simulated,
}

/// StorageService
///
/// Object storage for gallery images. The admin panel PUTs the file straight to the
/// bucket; the server only hands out signed URLs and the object keys to store.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if missing. Only used against local MinIO.
    async fn ensure_bucket_exists(&self) -> Result<(), StorageError>;

    /// Signed PUT URL for `key`, bound to `content_type`, valid for `UPLOAD_URL_TTL`.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// StorageState
pub type StorageState = Arc<dyn StorageService>;

/// gallery_object_key
///
/// A fresh `gallery/<uuid>.<ext>` key. The extension comes from the uploaded file name
/// and falls back to `bin` when missing or not plain alphanumeric.
pub fn gallery_object_key(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    format!("{}/{}.{}", GALLERY_PREFIX, Uuid::new_v4(), extension)
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a key cannot climb out of its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

// --- S3 ---

/// S3StorageClient
///
/// `StorageService` over the AWS SDK with path-style addressing, which both MinIO and
/// the Supabase storage gateway require.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket: String,
}

impl S3StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = s3::config::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "lab-cms",
        );

        let sdk_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .region(s3::config::Region::new(config.region.clone()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) -> Result<(), StorageError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }
        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Bucket(e.to_string()))?;
        tracing::info!("created bucket {}", self.bucket);
        Ok(())
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(sanitize_key(key))
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

// --- Test double ---

/// MockStorageService
///
/// Deterministic `StorageService`: URLs point at a fake local bucket. Built failing, every
/// call errors.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            Err(StorageError::Simulated)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) -> Result<(), StorageError> {
        self.check()
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.check()?;
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}
