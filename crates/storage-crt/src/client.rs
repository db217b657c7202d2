//! AWS SDK S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;

use s3_stash_common::DELETE_BATCH_SIZE;
use s3_stash_storage::{ObjectContent, ObjectInfo, StorageClient, StorageError, StorageSettings};

use crate::error::CrtError;

/// StorageClient implementation using AWS SDK for Rust.
///
/// Retry, connection pooling and streaming of file bodies are handled by
/// the SDK.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl CrtStorageClient {
    /// Create a new CRT storage client.
    ///
    /// Uses the default credential chain unless `settings.credentials` is set.
    ///
    /// # Arguments
    /// * `settings` - Storage settings including region and optional credentials
    ///
    /// # Errors
    /// `InvalidConfig` if the region is empty.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        if settings.region.trim().is_empty() {
            return Err(CrtError::ConfigError("region must not be empty".to_string()).into());
        }

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "s3-stash",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let config_loader = if let Some(ref endpoint) = settings.endpoint_url {
            config_loader.endpoint_url(endpoint)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        log::debug!(
            "Created S3 client for region {} (endpoint: {})",
            settings.region,
            settings.endpoint_url.as_deref().unwrap_or("default")
        );

        Ok(Self {
            s3_client: S3Client::from_conf(s3_config),
            expected_bucket_owner: None,
        })
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `expected_bucket_owner` - Optional expected bucket owner
    pub fn from_client(s3_client: S3Client, expected_bucket_owner: Option<String>) -> Self {
        Self {
            s3_client,
            expected_bucket_owner,
        }
    }

    /// Require every request to target a bucket owned by `owner`.
    pub fn with_expected_bucket_owner(mut self, owner: impl Into<String>) -> Self {
        self.expected_bucket_owner = Some(owner.into());
        self
    }
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let body = ByteStream::from(data.to_vec());

        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let output = request
            .send()
            .await
            .map_err(|err| storage_error(&err, bucket, key))?;

        Ok(output.e_tag().unwrap_or_default().to_string())
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let body = ByteStream::from_path(Path::new(file_path))
            .await
            .map_err(|e| StorageError::IoError {
                path: file_path.to_string(),
                message: e.to_string(),
            })?;

        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let output = request
            .send()
            .await
            .map_err(|err| storage_error(&err, bucket, key))?;

        Ok(output.e_tag().unwrap_or_default().to_string())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent, StorageError> {
        let mut request = self.s3_client.get_object().bucket(bucket).key(key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        let response = request
            .send()
            .await
            .map_err(|err| storage_error(&err, bucket, key))?;

        let etag: String = response.e_tag().unwrap_or_default().to_string();
        let content_type: Option<String> = response.content_type().map(|s| s.to_string());

        let data: Vec<u8> = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::NetworkError {
                message: e.to_string(),
                retryable: true,
            })?
            .into_bytes()
            .to_vec();

        Ok(ObjectContent {
            key: key.to_string(),
            data,
            etag,
            content_type,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut objects: Vec<ObjectInfo> = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .s3_client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix);

            if let Some(ref owner) = self.expected_bucket_owner {
                request = request.expected_bucket_owner(owner);
            }

            if let Some(ref token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|err| storage_error(&err, bucket, prefix))?;

            if let Some(ref contents) = response.contents {
                for obj in contents {
                    let last_modified: Option<i64> = obj
                        .last_modified()
                        .and_then(|dt| dt.to_millis().ok())
                        .map(|ms| ms / 1000);

                    objects.push(ObjectInfo {
                        key: obj.key().unwrap_or_default().to_string(),
                        size: obj.size().map(|s| s as u64).unwrap_or(0),
                        last_modified,
                        etag: obj.e_tag().map(|s| s.to_string()),
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token.clone();
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, StorageError> {
        let objects: Vec<ObjectInfo> = self.list_objects(bucket, prefix).await?;
        let mut deleted: u64 = 0;

        for batch in objects.chunks(DELETE_BATCH_SIZE) {
            let identifiers: Vec<ObjectIdentifier> = batch
                .iter()
                .map(|obj| ObjectIdentifier::builder().key(&obj.key).build())
                .collect::<Result<_, _>>()
                .map_err(|e| CrtError::ConfigError(e.to_string()))?;

            let delete: Delete = Delete::builder()
                .set_objects(Some(identifiers))
                .build()
                .map_err(|e| CrtError::ConfigError(e.to_string()))?;

            let mut request = self.s3_client.delete_objects().bucket(bucket).delete(delete);

            if let Some(ref owner) = self.expected_bucket_owner {
                request = request.expected_bucket_owner(owner);
            }

            let output = request
                .send()
                .await
                .map_err(|err| storage_error(&err, bucket, prefix))?;

            if let Some(failed) = output.errors().first() {
                return Err(StorageError::Other {
                    message: format!(
                        "Failed to delete s3://{}/{}: {}",
                        bucket,
                        failed.key().unwrap_or_default(),
                        failed.message().unwrap_or_default()
                    ),
                });
            }

            deleted += batch.len() as u64;
        }

        log::debug!("Deleted {} object(s) under s3://{}/{}", deleted, bucket, prefix);
        Ok(deleted)
    }
}

/// Map an SDK failure onto a storage error.
fn storage_error<E, R>(err: &SdkError<E, R>, bucket: &str, key: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let retryable: bool = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
    );
    classify(
        err.code(),
        DisplayErrorContext(err).to_string(),
        retryable,
        bucket,
        key,
    )
}

/// Classify an S3 error code.
fn classify(
    code: Option<&str>,
    message: String,
    retryable: bool,
    bucket: &str,
    key: &str,
) -> StorageError {
    match code {
        Some("NoSuchKey") | Some("NotFound") => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some("NoSuchBucket") => StorageError::BucketNotFound {
            bucket: bucket.to_string(),
        },
        Some("AccessDenied") | Some("Forbidden") | Some("AllAccessDisabled") => {
            StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            }
        }
        _ => CrtError::SdkError { message, retryable }.into(),
    }
}
