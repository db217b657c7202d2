//! Batch store orchestration.
//!
//! Every payload in a batch is written concurrently on the calling task and
//! the resulting tags are reassembled in input order. A batch either yields
//! one tag per payload or fails as a whole. Writes that landed before a
//! sibling failed are not rolled back.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::stream::{self, StreamExt};
use s3_stash_common::validate_key;

use crate::error::{SessionError, StorageError};
use crate::traits::{ProgressCallback, StorageClient};
use crate::types::{Namespace, Payload, PayloadSource, TransferProgress};

/// A payload resolved to its full object key.
struct PendingWrite {
    key: String,
    payload: Payload,
}

/// Write a batch of payloads and return their tags in input order.
///
/// # Arguments
/// * `client` - Storage backend
/// * `namespace` - Namespace the payload names are resolved against
/// * `payloads` - Payloads to write, at least one
/// * `progress` - Optional progress callback; returning false cancels the batch
///
/// # Errors
/// `InvalidArgument` for an empty batch, an invalid name, or a name repeated
/// within the batch (nothing is written). `StorageWrite` for the first failed
/// write in input order.
pub(crate) async fn store_payloads<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    payloads: Vec<Payload>,
    progress: Option<&dyn ProgressCallback>,
) -> Result<Vec<String>, SessionError> {
    let writes: Vec<PendingWrite> = resolve_writes(namespace, payloads)?;

    let total: u64 = writes.len() as u64;
    log::debug!("Storing {} object(s) under {}", total, namespace.root());

    let started = AtomicU64::new(0);
    let cancelled = AtomicBool::new(false);

    let results: Vec<Result<String, SessionError>> = stream::iter(writes)
        .map(|write| {
            let started = &started;
            let cancelled = &cancelled;

            async move {
                if cancelled.load(Ordering::Relaxed) {
                    return Err(SessionError::StorageWrite {
                        key: write.key,
                        source: StorageError::Cancelled,
                    });
                }

                if let Some(cb) = progress {
                    let update = TransferProgress {
                        current_key: write.key.clone(),
                        overall_started: started.fetch_add(1, Ordering::Relaxed) + 1,
                        overall_total: total,
                    };
                    if !cb.on_progress(&update) {
                        cancelled.store(true, Ordering::Relaxed);
                        return Err(SessionError::StorageWrite {
                            key: write.key,
                            source: StorageError::Cancelled,
                        });
                    }
                }

                write_one(client, &namespace.bucket, write).await
            }
        })
        .buffered(writes_in_flight(total))
        .collect()
        .await;

    // All writes have settled; report the first failure in input order.
    let mut tags: Vec<String> = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(tag) => tags.push(tag),
            Err(err) => {
                log::warn!("Batch store under {} failed: {}", namespace.root(), err);
                return Err(err);
            }
        }
    }

    Ok(tags)
}

/// Validate payload names and resolve them to object keys.
fn resolve_writes(
    namespace: &Namespace,
    payloads: Vec<Payload>,
) -> Result<Vec<PendingWrite>, SessionError> {
    if payloads.is_empty() {
        return Err(SessionError::invalid_argument(
            "store requires at least one payload",
        ));
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(payloads.len());
    let mut writes: Vec<PendingWrite> = Vec::with_capacity(payloads.len());

    for payload in payloads {
        let name: &str = validate_key(&payload.name).map_err(|e| {
            SessionError::invalid_argument(format!("payload {:?}: {}", payload.name, e))
        })?;
        let key: String = namespace.object_key(name);

        if !seen.insert(key.clone()) {
            return Err(SessionError::invalid_argument(format!(
                "payload {:?} appears more than once in the batch",
                payload.name
            )));
        }

        writes.push(PendingWrite { key, payload });
    }

    Ok(writes)
}

/// Issue one backend write.
async fn write_one<C: StorageClient + ?Sized>(
    client: &C,
    bucket: &str,
    write: PendingWrite,
) -> Result<String, SessionError> {
    let content_type: Option<&str> = write.payload.content_type.as_deref();

    let result: Result<String, StorageError> = match write.payload.source {
        PayloadSource::Bytes(ref data) => {
            client
                .put_object(bucket, &write.key, data, content_type)
                .await
        }
        PayloadSource::FilePath(ref path) => {
            client
                .put_object_from_file(bucket, &write.key, path, content_type)
                .await
        }
    };

    result.map_err(|source| SessionError::StorageWrite {
        key: write.key,
        source,
    })
}

/// Every write in a batch is in flight at once.
fn writes_in_flight(total: u64) -> usize {
    usize::try_from(total).unwrap_or(usize::MAX).max(1)
}
