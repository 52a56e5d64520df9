//! Atomic I/O operations with file locking

use crate::{Error, NormalizedPath, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffixes of the scratch siblings created by this module.
const SCRATCH_SUFFIXES: [&str; 3] = ["tmp", "staging", "old"];

/// Sibling path in the same directory, so renames stay on one filesystem.
fn sibling_path(native_path: &Path, suffix: &str) -> PathBuf {
    let name = format!(
        ".{}.{}.{}",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        suffix
    );
    native_path.with_file_name(name)
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock to prevent concurrent access.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = sibling_path(&native_path, "tmp");

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    drop(temp_file);

    fs::rename(&temp_path, &native_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&native_path, e)
    })?;

    tracing::trace!(path = %path, bytes = content.len(), "Wrote file atomically");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content, treating a missing file as `None`.
pub fn read_text_if_exists(path: &NormalizedPath) -> Result<Option<String>> {
    match read_text(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Remove scratch siblings of `target` left behind by an interrupted run.
///
/// Matches `.<name>.<pid>.tmp`, `.<name>.<pid>.staging` and
/// `.<name>.<pid>.old` for any pid. Returns how many were removed.
pub fn sweep_scratch(target: &NormalizedPath) -> Result<usize> {
    let native = target.to_native();
    let (Some(parent), Some(name)) = (native.parent(), native.file_name()) else {
        return Ok(0);
    };
    let prefix = format!(".{}.", name.to_string_lossy());

    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(Error::io(parent, e)),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(parent, e))?;
        let file_name = entry.file_name();
        let Some(rest) = file_name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        let is_scratch = rest.split_once('.').is_some_and(|(pid, suffix)| {
            !pid.is_empty()
                && pid.bytes().all(|b| b.is_ascii_digit())
                && SCRATCH_SUFFIXES.contains(&suffix)
        });
        if is_scratch && remove_path(&NormalizedPath::new(entry.path()))? {
            tracing::debug!(path = %entry.path().display(), "Removed leftover scratch path");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Create a fresh, empty staging directory next to `target`.
///
/// Any leftover staging directory from an interrupted run is removed first.
pub fn staging_dir_for(target: &NormalizedPath) -> Result<NormalizedPath> {
    let staging = sibling_path(&target.to_native(), "staging");
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;
    }
    fs::create_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;
    Ok(NormalizedPath::new(staging))
}

/// Swap a fully populated `staging` directory into place at `target`.
///
/// The previous `target` is moved aside before the rename and deleted after
/// it, so an interruption leaves either the old or the new tree in place.
pub fn replace_dir(staging: &NormalizedPath, target: &NormalizedPath) -> Result<()> {
    let target_native = target.to_native();
    let staging_native = staging.to_native();

    if !staging_native.is_dir() {
        return Err(Error::NotADirectory {
            path: staging_native,
        });
    }

    let retired = sibling_path(&target_native, "old");
    let had_previous = if target_native.is_dir() {
        if retired.exists() {
            fs::remove_dir_all(&retired).map_err(|e| Error::io(&retired, e))?;
        }
        fs::rename(&target_native, &retired).map_err(|e| Error::io(&target_native, e))?;
        true
    } else {
        if target_native.exists() {
            fs::remove_file(&target_native).map_err(|e| Error::io(&target_native, e))?;
        }
        false
    };

    if let Err(e) = fs::rename(&staging_native, &target_native) {
        if had_previous {
            let _ = fs::rename(&retired, &target_native);
        }
        return Err(Error::io(&target_native, e));
    }

    if had_previous {
        fs::remove_dir_all(&retired).map_err(|e| Error::io(&retired, e))?;
    }
    Ok(())
}

/// Remove a file or directory tree; missing paths are not an error.
pub fn remove_path(path: &NormalizedPath) -> Result<bool> {
    let native = path.to_native();
    let removed = if native.is_dir() {
        fs::remove_dir_all(&native)
    } else {
        fs::remove_file(&native)
    };
    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(native, e)),
    }
}
