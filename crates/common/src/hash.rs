//! Hash computation utilities.

/// Compute XXH128 hash of a byte slice.
///
/// # Arguments
/// * `data` - Bytes to hash
///
/// # Returns
/// 32-character lowercase hex string (128 bits).
pub fn hash_bytes(data: &[u8]) -> String {
    let hash: u128 = xxhash_rust::xxh3::xxh3_128(data);
    format!("{:032x}", hash)
}

/// Compute an ETag-style tag for object content.
///
/// The hex digest is wrapped in double quotes, matching the shape S3
/// returns in `ETag` headers.
pub fn etag_for(data: &[u8]) -> String {
    format!("\"{}\"", hash_bytes(data))
}
