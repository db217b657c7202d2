//! Shared error types used across s3-stash crates.

use thiserror::Error;

/// Object key validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Key is empty after trimming separators and whitespace.
    #[error("Object key must not be empty")]
    Empty,

    /// Key contains a segment that cannot be stored.
    #[error("Invalid object key {key}: {reason}")]
    Invalid {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl KeyError {
    /// Create an `Invalid` error.
    ///
    /// # Arguments
    /// * `key` - The rejected key
    /// * `reason` - Short description of the problem
    pub fn invalid(key: impl Into<String>, reason: &'static str) -> Self {
        Self::Invalid {
            key: key.into(),
            reason,
        }
    }
}
