//! Helpers for "/"-delimited blob keys and local paths

use crate::error::{BlobCliError, Result};
use std::path::Path;

/// Conventional folder delimiter inside blob keys
pub const KEY_DELIMITER: char = '/';

/// Final path component of a local file, as used in the remote key
pub fn file_basename(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BlobCliError::invalid_argument(format!(
                "'{}' does not name a file",
                path.display()
            ))
        })
}

/// `<prefix>/<name>`
pub fn join_blob_key(prefix: &str, name: &str) -> String {
    format!("{prefix}{KEY_DELIMITER}{name}")
}

/// Split a key at its first delimiter.
///
/// Returns `None` for keys without a delimiter, i.e. top-level files.
pub fn split_first_segment(key: &str) -> Option<(&str, &str)> {
    key.split_once(KEY_DELIMITER)
}

/// Folder name a user-supplied prefix refers to: surrounding whitespace and
/// trailing delimiters removed.
pub fn folder_name(prefix: &str) -> &str {
    prefix.trim().trim_end_matches(KEY_DELIMITER)
}

/// Normalize a prefix by ensuring it ends with the delimiter if non-empty
pub fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.ends_with(KEY_DELIMITER) {
        Some(trimmed.to_string())
    } else {
        Some(format!("{trimmed}{KEY_DELIMITER}"))
    }
}
