//! Object key utilities for namespace resolution.
//!
//! Keys are POSIX-style strings. A namespace is a bucket plus an optional
//! directory; every object key inside it is `directory/name`, or just `name`
//! when the namespace sits at the bucket root.

use crate::constants::{IMAGE_EXTENSIONS, KEY_SEPARATOR, ROOT_PREFIX};
use crate::error::KeyError;

/// Normalize a namespace directory.
///
/// Surrounding separators are removed and spaces become hyphens, so
/// `"/Holiday Photos/"` resolves to `"Holiday-Photos"`.
///
/// # Arguments
/// * `directory` - Directory as supplied by configuration
///
/// # Returns
/// The normalized directory, or `None` if nothing remains.
pub fn normalize_directory(directory: &str) -> Option<String> {
    let trimmed: &str = directory.trim_matches(KEY_SEPARATOR);
    if trimmed.trim().is_empty() {
        return None;
    }
    Some(trimmed.replace(' ', "-"))
}

/// Validate an object name relative to a namespace.
///
/// Leading separators are ignored (`"/a.png"` and `"a.png"` name the same
/// object).
///
/// # Arguments
/// * `key` - Name to validate
///
/// # Returns
/// The key without leading separators.
///
/// # Errors
/// `KeyError::Empty` for empty or whitespace-only keys, `KeyError::Invalid`
/// for directory-like keys or `..` segments.
pub fn validate_key(key: &str) -> Result<&str, KeyError> {
    let trimmed: &str = key.trim_start_matches(KEY_SEPARATOR);
    if trimmed.trim().is_empty() {
        return Err(KeyError::Empty);
    }
    if trimmed.ends_with(KEY_SEPARATOR) {
        return Err(KeyError::invalid(key, "key names a directory"));
    }
    if trimmed.split(KEY_SEPARATOR).any(|segment: &str| segment == "..") {
        return Err(KeyError::invalid(key, "parent segments are not allowed"));
    }
    Ok(trimmed)
}

/// Join a namespace directory and a relative key.
///
/// # Arguments
/// * `directory` - Normalized namespace directory, `None` for bucket root
/// * `key` - Validated relative key
///
/// # Returns
/// The full object key.
pub fn join_key(directory: Option<&str>, key: &str) -> String {
    match directory {
        Some(dir) => format!("{}{}{}", dir, KEY_SEPARATOR, key),
        None => key.to_string(),
    }
}

/// Resolve a caller-supplied listing prefix.
///
/// The namespace root is represented as `"/"`, a named prefix as `"name/"`.
///
/// # Arguments
/// * `prefix` - Optional prefix relative to the namespace
pub fn relative_prefix(prefix: Option<&str>) -> String {
    let trimmed: &str = prefix.unwrap_or_default().trim_matches(KEY_SEPARATOR);
    if trimmed.is_empty() {
        ROOT_PREFIX.to_string()
    } else {
        format!("{}{}", trimmed, KEY_SEPARATOR)
    }
}

/// Build the backend listing prefix for a resolved relative prefix.
///
/// # Arguments
/// * `directory` - Normalized namespace directory, `None` for bucket root
/// * `relative` - Output of [`relative_prefix`]
///
/// # Returns
/// The prefix to pass to the backend. Empty when listing the bucket root.
pub fn listing_prefix(directory: Option<&str>, relative: &str) -> String {
    let base: String = match directory {
        Some(dir) => format!("{}{}", dir, KEY_SEPARATOR),
        None => String::new(),
    };
    if relative == ROOT_PREFIX {
        base
    } else {
        format!("{}{}", base, relative)
    }
}

/// Strip a listing prefix from a listed key.
///
/// # Returns
/// The remainder of the key, or `None` if the key is outside the prefix, is
/// the prefix itself, or is a directory marker (ends with `/`).
pub fn relative_entry<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest: &str = key.strip_prefix(prefix)?;
    if rest.is_empty() || rest.ends_with(KEY_SEPARATOR) {
        return None;
    }
    Some(rest)
}

/// Like [`relative_entry`], but only for keys directly under the prefix.
pub fn direct_entry<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    relative_entry(prefix, key).filter(|rest: &&str| !rest.contains(KEY_SEPARATOR))
}

/// Check whether a key ends in one of the recognized image extensions.
///
/// Only the final path segment is considered and the comparison ignores
/// ASCII case, so `"c.PNG"` matches while `"b.txt"` and `"png"` do not.
pub fn has_image_extension(key: &str) -> bool {
    let file_name: &str = key.rsplit(KEY_SEPARATOR).next().unwrap_or(key);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|allowed: &&str| ext.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}
