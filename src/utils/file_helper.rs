//! File system utility functions.
//!
//! Provides thin wrappers around std::fs used by the converters.

use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;

/// Check if a file exists at the given path.
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Check if a directory exists at the given path.
pub fn directory_exists(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// True if the file extension matches one of `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Copy `src` to `dst` byte for byte, keeping permissions and timestamps.
///
/// Missing parent directories of `dst` are created.
pub fn copy_preserving_times(src: &Path, dst: &Path) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    File::open(dst)?.set_times(times)?;

    Ok(bytes)
}
