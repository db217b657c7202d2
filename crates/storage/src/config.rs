//! Session configuration.
//!
//! A [`SessionConfig`] names the bucket, an optional directory inside it and
//! the backend settings. It can be built in code, deserialized with serde, or
//! read from environment variables (optionally seeded from a `.env` file).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::types::{AwsCredentials, Namespace, StorageSettings};

/// Environment variable holding the bucket name.
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";
/// Environment variable holding the directory inside the bucket.
pub const ENV_BUCKET_DIRECTORY: &str = "BUCKET_DIRECTORY";
/// Environment variable holding the access key id.
pub const ENV_ACCESS_KEY: &str = "ACCESS_KEY";
/// Environment variable holding the secret access key.
pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
/// Environment variable holding an optional session token.
pub const ENV_SESSION_TOKEN: &str = "SESSION_TOKEN";
/// Environment variable holding the region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Environment variable holding a custom S3 endpoint.
pub const ENV_ENDPOINT_URL: &str = "S3_ENDPOINT_URL";
/// Environment variable enabling path-style addressing (`true` or `1`).
pub const ENV_FORCE_PATH_STYLE: &str = "S3_FORCE_PATH_STYLE";

/// Configuration a [`Session`](crate::Session) is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bucket name. Required.
    pub bucket: String,
    /// Directory inside the bucket. Spaces are replaced with hyphens.
    #[serde(default)]
    pub directory: Option<String>,
    /// Backend settings.
    #[serde(default)]
    pub settings: StorageSettings,
}

impl SessionConfig {
    /// Create a configuration for `bucket` with default settings.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            directory: None,
            settings: StorageSettings::default(),
        }
    }

    /// Set the directory inside the bucket.
    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set backend settings.
    pub fn with_settings(mut self, settings: StorageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Check required fields.
    ///
    /// # Errors
    /// `InvalidArgument` if the bucket name is empty.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.bucket.trim().is_empty() {
            return Err(SessionError::invalid_argument("bucket name is required"));
        }
        Ok(())
    }

    /// Namespace described by this configuration.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.bucket.trim(), self.directory.as_deref())
    }

    /// Read configuration from the process environment.
    ///
    /// Credentials are set only when both the access key and the secret key
    /// are present; otherwise the backend's default provider chain applies.
    ///
    /// # Errors
    /// `InvalidArgument` if `BUCKET_NAME` is missing or empty.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|name: &str| std::env::var(name).ok())
    }

    /// Load a `.env` file into the process environment, then read it.
    ///
    /// Variables already set in the environment take precedence over the file.
    ///
    /// # Arguments
    /// * `path` - Path to the `.env` file
    ///
    /// # Errors
    /// `InvalidArgument` if the file cannot be loaded or `BUCKET_NAME` is missing.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path: &Path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| {
            SessionError::invalid_argument(format!(
                "cannot load environment file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_env()
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SessionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());

        let bucket: String = non_empty(ENV_BUCKET_NAME).ok_or_else(|| {
            SessionError::invalid_argument(format!("{} is not set", ENV_BUCKET_NAME))
        })?;

        let credentials: Option<AwsCredentials> =
            match (non_empty(ENV_ACCESS_KEY), non_empty(ENV_SECRET_KEY)) {
                (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                    access_key_id,
                    secret_access_key,
                    session_token: non_empty(ENV_SESSION_TOKEN),
                }),
                _ => None,
            };

        let defaults = StorageSettings::default();
        let settings = StorageSettings {
            region: non_empty(ENV_REGION).unwrap_or(defaults.region),
            credentials,
            endpoint_url: non_empty(ENV_ENDPOINT_URL),
            force_path_style: non_empty(ENV_FORCE_PATH_STYLE)
                .map(|value: String| {
                    value.eq_ignore_ascii_case("true") || value.trim() == "1"
                })
                .unwrap_or(false),
        };

        let config = Self {
            bucket,
            directory: non_empty(ENV_BUCKET_DIRECTORY),
            settings,
        };
        log::debug!("Loaded session configuration for {}", config.namespace().root());
        Ok(config)
    }
}
