//! Local state inspection for a sync target path

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// On-disk state of a repository's target path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalState {
    /// Nothing exists at the path
    Absent,
    /// A directory holding a `.git` marker
    ValidClone,
    /// Something other than a directory occupies the path
    BlockedFile,
    /// A directory the current user cannot write to or traverse
    BlockedPermission,
    /// A directory without a `.git` marker. It has already been removed
    /// by the time this value is returned.
    Garbage,
}

/// Classify `path`, removing it first if it is a garbage directory.
///
/// Checks run in a fixed order: existence, directory, permissions, then the
/// `.git` marker. Blocked paths are never touched.
pub fn inspect(path: &Path) -> io::Result<LocalState> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LocalState::Absent),
        Err(e) => return Err(e),
    };

    if !metadata.is_dir() {
        return Ok(LocalState::BlockedFile);
    }

    if !is_writable_dir(path, &metadata) {
        return Ok(LocalState::BlockedPermission);
    }

    if path.join(".git").exists() {
        return Ok(LocalState::ValidClone);
    }

    debug!("Removing garbage directory: {}", path.display());
    if let Err(e) = fs::remove_dir_all(path) {
        debug!("Failed to remove {}: {}", path.display(), e);
    }

    Ok(LocalState::Garbage)
}

#[cfg(unix)]
fn is_writable_dir(path: &Path, _metadata: &fs::Metadata) -> bool {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable_dir(_path: &Path, metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}
