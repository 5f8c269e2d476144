//! Pass-through file actions offered on scan results: delete and reveal.
//! The scanner never calls these itself.

use crate::error::{DeleteError, RevealError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// How a file is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Remove the file for good
    #[default]
    Permanent,
    /// Move the file to the platform trash / recycle bin
    Trash,
}

#[cfg(windows)]
fn is_in_use(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_in_use(err: &io::Error) -> bool {
    // EBUSY
    matches!(err.raw_os_error(), Some(16))
}

fn classify(path: &Path, err: io::Error) -> DeleteError {
    match err.kind() {
        io::ErrorKind::NotFound => DeleteError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => DeleteError::PermissionDenied(path.to_path_buf()),
        _ if is_in_use(&err) => DeleteError::InUse(path.to_path_buf()),
        _ => DeleteError::Io {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

/// Deletes a single file. Directories are refused; nothing is retried.
pub fn delete_file(path: &Path, mode: DeleteMode) -> Result<(), DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| classify(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }

    match mode {
        DeleteMode::Permanent => fs::remove_file(path).map_err(|e| classify(path, e))?,
        DeleteMode::Trash => trash::delete(path).map_err(|e| DeleteError::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
    }

    info!(file = %path.display(), ?mode, "deleted");
    Ok(())
}

/// Folder that contains `path`; a bare file name resolves to `.`
pub fn containing_folder(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Opens the folder containing `path` in the platform file manager.
///
/// Fails without side effects when that folder no longer exists.
pub fn reveal_in_file_manager(path: &Path) -> Result<(), RevealError> {
    let folder = containing_folder(path);
    if !folder.is_dir() {
        return Err(RevealError::FolderMissing(folder));
    }

    open::that_detached(&folder).map_err(|source| RevealError::Launch {
        path: folder.clone(),
        source,
    })
}
