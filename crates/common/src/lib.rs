//! Shared types and utilities for s3-stash.
//!
//! This crate provides functionality used by the storage crates:
//! - Object key normalization and joining
//! - The image-extension allow-list used by prefix retrieval
//! - Content hashing for backend-generated tags
//! - Shared constants and error types

pub mod constants;
pub mod error;
pub mod hash;
pub mod key_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::KeyError;
pub use hash::{etag_for, hash_bytes};
pub use key_utils::{
    direct_entry, has_image_extension, join_key, listing_prefix, normalize_directory,
    relative_entry, relative_prefix, validate_key,
};
