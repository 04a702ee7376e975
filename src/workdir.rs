//! Working-directory lifecycle for a run.
//!
//! Each run owns a single root directory under which every repository is
//! materialized into a numbered subdirectory. This module brings that root to
//! a fresh state before the run starts and tears it down afterwards.
//!
//! A marker file is written into the root when it is prepared. On the next
//! run against the same path, the marker distinguishes "leftovers of a
//! previous run" (safe to erase and start over) from "a directory someone
//! else owns" (refused with [`Error::DirectoryNotEmpty`]).

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the marker file written into a prepared working directory.
pub const RUN_MARKER: &str = ".repo-fleet-run";

/// Bring the working directory to a fresh, empty state.
///
/// - If the path does not exist, it is created.
/// - If it exists and is empty, it is kept as-is.
/// - If it exists, is non-empty, and carries the run marker, the previous
///   run's leftovers are erased and the directory is recreated.
/// - Otherwise the call fails with [`Error::DirectoryNotEmpty`].
pub fn prepare(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::DirectoryNotEmpty {
                path: path.to_path_buf(),
            });
        }
        let occupied = fs::read_dir(path)?.next().is_some();
        if occupied {
            if !path.join(RUN_MARKER).is_file() {
                return Err(Error::DirectoryNotEmpty {
                    path: path.to_path_buf(),
                });
            }
            remove_tree(path)?;
            fs::create_dir_all(path)?;
        }
    } else {
        fs::create_dir_all(path)?;
    }
    fs::write(path.join(RUN_MARKER), b"")?;
    Ok(())
}

/// Recursively delete a path, which may be a regular file, a directory, or a
/// nested tree. Children are removed before their parent. A missing path is
/// a no-op.
pub fn remove_tree(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if path.is_file() {
        fs::remove_file(path)?;
    } else {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Best-effort recursive delete for the cleanup phase.
///
/// Walks the tree in post-order and logs every entry that cannot be removed
/// instead of raising, so a single stubborn file does not leave the rest of
/// the tree behind.
pub fn remove_tree_logged(path: &Path) {
    if !path.exists() {
        return;
    }
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("cleanup: could not remove {}: {}", path.display(), e);
        }
        return;
    }
    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries.flatten() {
                remove_tree_logged(&entry.path());
            }
        }
        Err(e) => {
            log::warn!("cleanup: could not read {}: {}", path.display(), e);
        }
    }
    if let Err(e) = fs::remove_dir(path) {
        log::warn!("cleanup: could not remove {}: {}", path.display(), e);
    }
}
