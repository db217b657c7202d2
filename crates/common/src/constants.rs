//! Shared constants used across s3-stash crates.

/// File extensions retrieved by prefix listings (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];

/// Prefix that stands for the namespace root in listings.
pub const ROOT_PREFIX: &str = "/";

/// Object key separator.
pub const KEY_SEPARATOR: char = '/';

/// Maximum number of keys accepted by a single S3 DeleteObjects request.
pub const DELETE_BATCH_SIZE: usize = 1000;

/// Default AWS region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";
