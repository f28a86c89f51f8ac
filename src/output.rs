// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Output Helpers
//!
//! Thin wrappers over `std::fs` used by every stage that touches the
//! disk. Each one attaches the offending path to its error and creates
//! missing parent directories before writing.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::{LeafpressError, Result};

/// Creates `path` and all missing parents.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path)
        .map_err(|e| LeafpressError::io_error(path.to_path_buf(), e))
}

/// Reads a UTF-8 file.
///
/// # Arguments
///
/// * `path` - A reference to the path of the file to read.
///
/// # Errors
///
/// Returns `LeafpressError::IOError` carrying `path` if reading fails.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .map_err(|e| LeafpressError::io_error(path.to_path_buf(), e))
}

/// Writes `contents` to `path`, replacing any existing file.
///
/// # Arguments
///
/// * `path` - A reference to the path of the file to write to.
/// * `contents` - The bytes to write.
///
/// # Errors
///
/// Returns `LeafpressError::IOError` if the parent directory cannot be
/// created or the write fails.
pub fn write_file<P, C>(path: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .map_err(|e| LeafpressError::io_error(path.to_path_buf(), e))
}

/// Copies a file byte-for-byte, creating the destination's parents.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    _ = fs::copy(from, to)
        .map_err(|e| LeafpressError::io_error(from.to_path_buf(), e))?;
    Ok(())
}

/// Rejects output directories that must never be wiped.
///
/// All three paths are expected to be absolute. The target is refused
/// when it is the filesystem root, the working directory, the source
/// directory, or an ancestor of either.
pub fn check_clean_target(target: &Path, source: &Path, cwd: &Path) -> Result<()> {
    if target.parent().is_none() {
        return Err(LeafpressError::unsafe_clean(
            target.to_path_buf(),
            "target is the filesystem root",
        ));
    }
    if cwd.starts_with(target) {
        return Err(LeafpressError::unsafe_clean(
            target.to_path_buf(),
            "target is the current directory or one of its parents",
        ));
    }
    if source.starts_with(target) {
        return Err(LeafpressError::unsafe_clean(
            target.to_path_buf(),
            "target is the source directory or one of its parents",
        ));
    }
    Ok(())
}

/// Removes the output directory after [`check_clean_target`] accepts it.
///
/// A target that does not exist yet is not an error.
pub fn clean_output_dir(target: &Path, source: &Path) -> Result<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| LeafpressError::io_error(PathBuf::from("."), e))?;
    let target = resolve_existing(target);
    check_clean_target(&target, &resolve_existing(source), &resolve_existing(&cwd))?;

    if target.exists() {
        info!("Cleaning output directory {}", target.display());
        fs::remove_dir_all(&target)
            .map_err(|e| LeafpressError::io_error(target.clone(), e))?;
    }
    Ok(())
}

/// Canonical form of `path` when it exists, otherwise its absolute form.
pub fn resolve_existing(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.html");
        write_file(&path, "Sample content").unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "Sample content");
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = read_to_string(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("logo.bin");
        let bytes = [0u8, 159, 146, 150, 255];
        fs::write(&from, bytes).unwrap();

        let to = dir.path().join("out/assets/logo.bin");
        copy_file(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), bytes);
    }

    #[test]
    fn test_check_clean_target_rejections() {
        let source = Path::new("/work/site/src");
        let cwd = Path::new("/work/site");

        assert!(check_clean_target(Path::new("/"), source, cwd).is_err());
        assert!(check_clean_target(cwd, source, cwd).is_err());
        assert!(check_clean_target(source, source, cwd).is_err());
        assert!(check_clean_target(Path::new("/work"), source, cwd).is_err());
        assert!(check_clean_target(Path::new("/work/site/html"), source, cwd).is_ok());
    }

    #[test]
    fn test_clean_output_dir_removes_tree() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let target = dir.path().join("html");
        fs::create_dir_all(&source).unwrap();
        write_file(target.join("stale.html"), "old").unwrap();

        clean_output_dir(&target, &source).unwrap();
        assert!(!target.exists());

        clean_output_dir(&target, &source).unwrap();
    }

    #[test]
    fn test_clean_refuses_source_dir() {
        let dir = TempDir::new().unwrap();
        let err = clean_output_dir(dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err, LeafpressError::UnsafeClean { .. }));
        assert!(dir.path().exists());
    }
}
