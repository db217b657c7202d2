//! Sessions bind one configuration to one storage client.
//!
//! # Example
//!
//! ```ignore
//! use s3_stash_storage::{create_session, MemoryStorageClient, Payload, SessionConfig};
//!
//! let client = MemoryStorageClient::new().with_bucket("images");
//! let session = create_session(SessionConfig::new("images").with_directory("uploads"), client)?;
//!
//! let tags = session.store(Payload::from_bytes("cat.png", png_bytes)).await?;
//! let cat = session.get("cat.png").await?;
//! assert_eq!(cat.etag, tags[0]);
//!
//! let images = session.get_all(None).await?;
//! ```

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::retrieve::{self, ListingDepth};
use crate::store;
use crate::traits::{ProgressCallback, StorageClient};
use crate::types::{Namespace, ObjectContent, Payload};

/// Store and retrieve operations bound to one namespace and one client.
///
/// Cloning a session shares its client. Sessions hold no other state, so any
/// number of them may run side by side.
pub struct Session<C: StorageClient> {
    config: SessionConfig,
    namespace: Namespace,
    client: Arc<C>,
}

impl<C: StorageClient> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            namespace: self.namespace.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: StorageClient> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Create a session. See [`Session::new`].
pub fn create_session<C: StorageClient>(
    config: SessionConfig,
    client: C,
) -> Result<Session<C>, SessionError> {
    Session::new(config, client)
}

impl<C: StorageClient> Session<C> {
    /// Create a session that owns `client`.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration has no bucket name.
    pub fn new(config: SessionConfig, client: C) -> Result<Self, SessionError> {
        Self::with_shared_client(config, Arc::new(client))
    }

    /// Create a session around an already shared client.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration has no bucket name.
    pub fn with_shared_client(config: SessionConfig, client: Arc<C>) -> Result<Self, SessionError> {
        config.validate()?;
        let namespace: Namespace = config.namespace();
        log::debug!("Opened session on {}", namespace.root());
        Ok(Self {
            config,
            namespace,
            client,
        })
    }

    /// Namespace every key is resolved against.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Configuration the session was built from.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying client, for operations this crate does not wrap.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Store one payload or a batch.
    ///
    /// # Returns
    /// One tag per payload, in input order.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty batch, an invalid name or a repeated
    /// name. `StorageWrite` if any write fails; no tags are returned then.
    pub async fn store(
        &self,
        payloads: impl Into<Vec<Payload>>,
    ) -> Result<Vec<String>, SessionError> {
        self.store_with_progress(payloads, None).await
    }

    /// Store with progress reporting. A callback returning false cancels
    /// the batch, which then fails with a `Cancelled` cause.
    pub async fn store_with_progress(
        &self,
        payloads: impl Into<Vec<Payload>>,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<Vec<String>, SessionError> {
        store::store_payloads(&*self.client, &self.namespace, payloads.into(), progress).await
    }

    /// Read one object.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty key, `StorageRead` if the read fails.
    pub async fn get(&self, key: &str) -> Result<ObjectContent, SessionError> {
        retrieve::get_object(&*self.client, &self.namespace, key).await
    }

    /// Read every image directly under `prefix` (the namespace root if `None`).
    ///
    /// # Errors
    /// `Listing` if listing fails, `StorageRead` if any fetch fails.
    pub async fn get_all(&self, prefix: Option<&str>) -> Result<Vec<ObjectContent>, SessionError> {
        retrieve::get_all(&*self.client, &self.namespace, prefix, ListingDepth::Direct).await
    }

    /// Read every image at any depth below `prefix`.
    pub async fn get_all_recursive(
        &self,
        prefix: Option<&str>,
    ) -> Result<Vec<ObjectContent>, SessionError> {
        retrieve::get_all(&*self.client, &self.namespace, prefix, ListingDepth::Recursive).await
    }

    /// Keys of the images [`get_all`](Self::get_all) would fetch, relative to
    /// the namespace.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, SessionError> {
        retrieve::list_images(&*self.client, &self.namespace, prefix, ListingDepth::Direct).await
    }

    /// Delete every object under the namespace.
    ///
    /// At the bucket root this empties the bucket.
    ///
    /// # Returns
    /// Number of objects deleted.
    ///
    /// # Errors
    /// `Delete` if the backend listing or deletion fails.
    pub async fn clear(&self) -> Result<u64, SessionError> {
        let prefix: String = self.namespace.list_prefix(s3_stash_common::ROOT_PREFIX);
        let deleted: u64 = self
            .client
            .delete_prefix(&self.namespace.bucket, &prefix)
            .await
            .map_err(|source| {
                log::warn!("Clearing {} failed: {}", self.namespace.root(), source);
                SessionError::Delete {
                    prefix: prefix.clone(),
                    source,
                }
            })?;
        log::debug!("Deleted {} object(s) under {}", deleted, self.namespace.root());
        Ok(deleted)
    }
}
