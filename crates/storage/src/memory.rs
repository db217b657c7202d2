//! In-memory storage backend.
//!
//! Intended for tests and embedding. Buckets hold objects in ordered maps so
//! listings come back in lexicographic key order, as they do from S3. Buckets
//! are never created implicitly: writing to an unknown bucket fails.
//!
//! Faults and per-key latency can be injected to exercise batch error
//! handling and completion-order independence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use s3_stash_common::etag_for;

use crate::error::StorageError;
use crate::traits::{ObjectInfo, StorageClient};
use crate::types::ObjectContent;

/// A stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    etag: String,
    content_type: Option<String>,
}

/// Injected failures and delays.
#[derive(Debug, Default)]
struct Faults {
    write_keys: HashSet<String>,
    read_keys: HashSet<String>,
    fail_listings: bool,
    delays: HashMap<String, Duration>,
}

/// Objects per bucket, ordered by key.
type BucketMap = HashMap<String, BTreeMap<String, StoredObject>>;

/// HashMap-of-BTreeMap backed `StorageClient`.
#[derive(Debug, Default)]
pub struct MemoryStorageClient {
    buckets: RwLock<BucketMap>,
    faults: RwLock<Faults>,
    puts: AtomicU64,
    gets: AtomicU64,
    lists: AtomicU64,
}

impl MemoryStorageClient {
    /// Create a client with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bucket and return the client (builder style).
    pub fn with_bucket(self, bucket: impl Into<String>) -> Self {
        self.create_bucket(bucket);
        self
    }

    /// Create a bucket. Existing buckets are left untouched.
    pub fn create_bucket(&self, bucket: impl Into<String>) {
        self.buckets_mut().entry(bucket.into()).or_default();
    }

    /// Make every write to `key` fail.
    pub fn fail_writes_to(&self, key: impl Into<String>) {
        self.faults_mut().write_keys.insert(key.into());
    }

    /// Make every read of `key` fail.
    pub fn fail_reads_from(&self, key: impl Into<String>) {
        self.faults_mut().read_keys.insert(key.into());
    }

    /// Make every listing fail.
    pub fn fail_listings(&self) {
        self.faults_mut().fail_listings = true;
    }

    /// Delay reads and writes of `key` by `delay`.
    pub fn delay_key(&self, key: impl Into<String>, delay: Duration) {
        self.faults_mut().delays.insert(key.into(), delay);
    }

    /// Number of write calls received.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of read calls received.
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of listing calls received.
    pub fn list_count(&self) -> u64 {
        self.lists.load(Ordering::SeqCst)
    }

    /// Sorted keys currently stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    // Poisoned locks are recovered; every mutation is a single map operation.
    fn buckets(&self) -> RwLockReadGuard<'_, BucketMap> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn buckets_mut(&self) -> RwLockWriteGuard<'_, BucketMap> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_mut(&self) -> RwLockWriteGuard<'_, Faults> {
        self.faults.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the configured delay for `key`, then report whether it should fail.
    async fn injected(&self, key: &str, check: fn(&Faults, &str) -> bool) -> bool {
        let (delay, fail): (Option<Duration>, bool) = {
            let faults = self.faults.read().unwrap_or_else(PoisonError::into_inner);
            (faults.delays.get(key).copied(), check(&faults, key))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        fail
    }

    fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let mut buckets = self.buckets_mut();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        let etag: String = etag_for(&data);
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                etag: etag.clone(),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(etag)
    }

    async fn write(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self
            .injected(key, |f: &Faults, k: &str| f.write_keys.contains(k))
            .await
        {
            return Err(injected_failure("write", key));
        }
        self.store(bucket, key, data, content_type)
    }
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.write(bucket, key, data.to_vec(), content_type).await
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let data: Vec<u8> = tokio::fs::read(file_path)
            .await
            .map_err(|e| StorageError::IoError {
                path: file_path.to_string(),
                message: e.to_string(),
            })?;
        self.write(bucket, key, data, content_type).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self
            .injected(key, |f: &Faults, k: &str| f.read_keys.contains(k))
            .await
        {
            return Err(injected_failure("read", key));
        }

        let buckets = self.buckets();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;
        let object: &StoredObject = objects.get(key).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        Ok(ObjectContent {
            key: key.to_string(),
            data: object.data.clone(),
            etag: object.etag.clone(),
            content_type: object.content_type.clone(),
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, StorageError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self
            .injected(prefix, |f: &Faults, _: &str| f.fail_listings)
            .await
        {
            return Err(injected_failure("list", prefix));
        }

        let buckets = self.buckets();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: None,
                etag: Some(object.etag.clone()),
            })
            .collect())
    }

    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, StorageError> {
        let mut buckets = self.buckets_mut();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        let before: usize = objects.len();
        objects.retain(|key, _| !key.starts_with(prefix));
        Ok((before - objects.len()) as u64)
    }
}

fn injected_failure(operation: &str, key: &str) -> StorageError {
    StorageError::NetworkError {
        message: format!("injected {} failure for {}", operation, key),
        retryable: false,
    }
}
