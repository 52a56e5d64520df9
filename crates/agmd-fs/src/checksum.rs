//! SHA-256 checksums for composed output
//!
//! The sync engine compares the checksum of a freshly composed document with
//! the one already on disk and skips the write when they match.

use crate::{Error, NormalizedPath, Result};
use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the checksum of raw bytes as `"sha256:<hex>"`.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Checksum of a file's contents, or `None` if the file does not exist.
pub fn file_checksum(path: &NormalizedPath) -> Result<Option<String>> {
    let native = path.to_native();
    match std::fs::read(&native) {
        Ok(content) => Ok(Some(compute_checksum(&content))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(native, e)),
    }
}
