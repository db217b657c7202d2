//! Single-object and prefix retrieval.
//!
//! Prefix retrieval lists the prefix, keeps only image entries (gif, jpg,
//! jpeg, png, any case) and fetches each one through the single-object read
//! path. Fetches run concurrently; results follow the filtered listing order.

use futures::stream::{self, StreamExt};
use s3_stash_common::{
    direct_entry, has_image_extension, relative_entry, relative_prefix, validate_key, ROOT_PREFIX,
};

use crate::error::SessionError;
use crate::traits::{ObjectInfo, StorageClient};
use crate::types::{Namespace, ObjectContent};

/// How far below a prefix a listing reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingDepth {
    /// Only entries directly under the prefix. Deeper keys are subdirectory
    /// content and are skipped.
    Direct,
    /// Every key below the prefix.
    Recursive,
}

/// Read one object.
///
/// # Arguments
/// * `client` - Storage backend
/// * `namespace` - Namespace the key is resolved against
/// * `key` - Object name relative to the namespace
///
/// # Errors
/// `InvalidArgument` for an empty key (no backend call is made).
/// `StorageRead` when the backend read fails, including missing objects.
pub(crate) async fn get_object<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    key: &str,
) -> Result<ObjectContent, SessionError> {
    let key: &str = validate_key(key)?;
    read_object(client, namespace, &namespace.object_key(key)).await
}

/// Read one object by its full backend key, which is used verbatim.
async fn read_object<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    full_key: &str,
) -> Result<ObjectContent, SessionError> {
    client
        .get_object(&namespace.bucket, full_key)
        .await
        .map_err(|source| {
            log::warn!("Read of s3://{}/{} failed: {}", namespace.bucket, full_key, source);
            SessionError::StorageRead {
                key: full_key.to_string(),
                source,
            }
        })
}

/// An image entry found by a listing.
struct ListedImage {
    /// Key relative to the namespace.
    relative: String,
    /// Key exactly as the backend listed it.
    object_key: String,
}

/// List image entries under a prefix.
///
/// # Arguments
/// * `client` - Storage backend
/// * `namespace` - Namespace the prefix is resolved against
/// * `prefix` - Optional prefix relative to the namespace, `None` for its root
/// * `depth` - Direct children only, or everything below the prefix
///
/// # Returns
/// Keys relative to the namespace (e.g. `"thumbs/a.png"`), in listing order.
pub(crate) async fn list_images<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    prefix: Option<&str>,
    depth: ListingDepth,
) -> Result<Vec<String>, SessionError> {
    let images: Vec<ListedImage> = list_listed(client, namespace, prefix, depth).await?;
    Ok(images.into_iter().map(|image| image.relative).collect())
}

async fn list_listed<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    prefix: Option<&str>,
    depth: ListingDepth,
) -> Result<Vec<ListedImage>, SessionError> {
    let relative: String = relative_prefix(prefix);
    if relative != ROOT_PREFIX {
        validate_key(relative.trim_end_matches('/'))?;
    }
    let list_prefix: String = namespace.list_prefix(&relative);

    let objects: Vec<ObjectInfo> = client
        .list_objects(&namespace.bucket, &list_prefix)
        .await
        .map_err(|source| {
            log::warn!("Listing s3://{}/{} failed: {}", namespace.bucket, list_prefix, source);
            SessionError::Listing {
                prefix: relative.clone(),
                source,
            }
        })?;

    let base: &str = if relative == ROOT_PREFIX { "" } else { relative.as_str() };
    let images: Vec<ListedImage> = filter_images(&list_prefix, &objects, depth)
        .into_iter()
        .map(|(entry, object_key): (&str, &str)| ListedImage {
            relative: format!("{}{}", base, entry),
            object_key: object_key.to_string(),
        })
        .collect();

    log::debug!(
        "Listed {} object(s) under s3://{}/{}, {} image(s)",
        objects.len(),
        namespace.bucket,
        list_prefix,
        images.len()
    );

    Ok(images)
}

/// Fetch every image under a prefix.
///
/// # Errors
/// `Listing` if the listing fails, otherwise the first `StorageRead` failure
/// in listing order. No partial result is returned.
pub(crate) async fn get_all<C: StorageClient + ?Sized>(
    client: &C,
    namespace: &Namespace,
    prefix: Option<&str>,
    depth: ListingDepth,
) -> Result<Vec<ObjectContent>, SessionError> {
    let images: Vec<ListedImage> = list_listed(client, namespace, prefix, depth).await?;
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let in_flight: usize = images.len();
    let results: Vec<Result<ObjectContent, SessionError>> = stream::iter(images)
        .map(|image| async move { read_object(client, namespace, &image.object_key).await })
        .buffered(in_flight)
        .collect()
        .await;

    results.into_iter().collect()
}

/// Keep listed entries that sit under `list_prefix` at the requested depth
/// and carry an image extension.
///
/// # Returns
/// `(entry, key)` pairs in listing order, where `entry` is relative to
/// `list_prefix` and `key` is the listed key.
fn filter_images<'a>(
    list_prefix: &str,
    objects: &'a [ObjectInfo],
    depth: ListingDepth,
) -> Vec<(&'a str, &'a str)> {
    objects
        .iter()
        .filter_map(|obj| {
            let entry: &str = match depth {
                ListingDepth::Direct => direct_entry(list_prefix, &obj.key)?,
                ListingDepth::Recursive => relative_entry(list_prefix, &obj.key)?,
            };
            Some((entry, obj.key.as_str()))
        })
        .filter(|(entry, _)| has_image_extension(entry))
        .collect()
}
