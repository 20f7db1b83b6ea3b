//! Seed file I/O.
//!
//! A seed file is an uninterpreted blob: whatever bytes are in it are
//! mixed in on load, and a save writes fresh snapshot material. None of
//! these helpers touch the PRNG state, so the service can run them
//! without holding its lock.

use super::EntropyError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Bytes read from a device, pipe or other non-regular file.
pub(crate) const NON_REGULAR_LOAD_BYTES: u64 = 1024;

/// Checks a caller-supplied path before it reaches the filesystem.
pub(crate) fn validate_path(path: &str) -> Result<PathBuf, EntropyError> {
    let reason = if path.is_empty() {
        Some("path is empty")
    } else if path.contains('\0') {
        Some("path contains an embedded NUL byte")
    } else if path.chars().any(char::is_control) {
        Some("path contains control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(EntropyError::InvalidPath {
            path: path.escape_debug().to_string(),
            reason,
        }),
        None => Ok(PathBuf::from(path)),
    }
}

/// Reads a seed file, up to `limit` bytes if given.
///
/// Regular files are read whole when no limit is set. Anything else
/// (`/dev/urandom`, a FIFO) never ends on its own, so at most
/// [`NON_REGULAR_LOAD_BYTES`] are read from it.
pub(crate) fn read(path: PathBuf, limit: Option<u64>) -> Result<Vec<u8>, EntropyError> {
    let result = File::open(&path).and_then(|file| {
        let limit = if file.metadata()?.is_file() {
            limit
        } else {
            Some(limit.map_or(NON_REGULAR_LOAD_BYTES, |l| l.min(NON_REGULAR_LOAD_BYTES)))
        };

        let mut data = Vec::new();
        match limit {
            Some(limit) => file.take(limit).read_to_end(&mut data)?,
            None => (&file).read_to_end(&mut data)?,
        };
        Ok(data)
    });

    result.map_err(|source| EntropyError::SeedFile { path, source })
}

/// Writes `material` to a seed file, creating or truncating it.
///
/// New files are created readable by the owner only.
pub(crate) fn write(path: PathBuf, material: &[u8]) -> Result<(), EntropyError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let result = options.open(&path).and_then(|mut file| {
        file.write_all(material)?;
        file.sync_all()
    });

    result.map_err(|source| EntropyError::SeedFile { path, source })
}
