//! Shared data structures for storage operations.

use s3_stash_common::{join_key, listing_prefix, normalize_directory, DEFAULT_REGION};
use serde::{Deserialize, Serialize};

/// Configuration settings for the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// AWS credentials. The default provider chain is used when absent.
    pub credentials: Option<AwsCredentials>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint_url: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`).
    pub force_path_style: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.into(),
            credentials: None,
            endpoint_url: None,
            force_path_style: false,
        }
    }
}

/// AWS credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bucket and directory that every session operation is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// S3 bucket name.
    pub bucket: String,
    /// Normalized directory inside the bucket, `None` for the bucket root.
    pub directory: Option<String>,
}

impl Namespace {
    /// Create a namespace, normalizing the directory.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `directory` - Optional directory (spaces become hyphens)
    pub fn new(bucket: impl Into<String>, directory: Option<&str>) -> Self {
        Self {
            bucket: bucket.into(),
            directory: directory.and_then(normalize_directory),
        }
    }

    /// Full object key for a validated relative key.
    /// Returns: "{directory}/{key}" or "{key}" at the bucket root.
    pub fn object_key(&self, key: &str) -> String {
        join_key(self.directory.as_deref(), key)
    }

    /// Backend listing prefix for a resolved relative prefix (`"/"` or `"name/"`).
    pub fn list_prefix(&self, relative: &str) -> String {
        listing_prefix(self.directory.as_deref(), relative)
    }

    /// Human-readable root of the namespace, e.g. `"bucket/uploads"`.
    pub fn root(&self) -> String {
        match self.directory {
            Some(ref dir) => format!("{}/{}", self.bucket, dir),
            None => self.bucket.clone(),
        }
    }
}

/// Source of data for a payload.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// In-memory bytes.
    Bytes(Vec<u8>),
    /// Stream from the file at this path.
    FilePath(String),
}

/// A named value to store.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Object name within the session namespace.
    pub name: String,
    /// Where the content comes from.
    pub source: PayloadSource,
    /// Optional MIME type sent with the write.
    pub content_type: Option<String>,
}

impl Payload {
    /// Payload backed by in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: PayloadSource::Bytes(data.into()),
            content_type: None,
        }
    }

    /// Payload streamed from a local file.
    pub fn from_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: PayloadSource::FilePath(path.into()),
            content_type: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl From<Payload> for Vec<Payload> {
    fn from(payload: Payload) -> Self {
        vec![payload]
    }
}

/// Content of one retrieved object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContent {
    /// Full object key.
    pub key: String,
    /// Object bytes.
    pub data: Vec<u8>,
    /// Tag reported by the backend; matches the tag returned when it was stored.
    pub etag: String,
    /// Content type, if the backend recorded one.
    pub content_type: Option<String>,
}

impl ObjectContent {
    /// Content decoded as UTF-8.
    ///
    /// # Errors
    /// Returns the decoding error if the bytes are not valid UTF-8.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.data)
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the object is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Progress update for a store batch.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Key of the object about to be processed.
    pub current_key: String,
    /// Objects dispatched so far, including this one.
    pub overall_started: u64,
    /// Total objects in the batch.
    pub overall_total: u64,
}
