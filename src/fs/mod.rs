//! The virtual filesystem the fake server variant runs against.
//!
//! Only the query/permission contract matters to the command handlers; the
//! bundled [`InMemoryFs`] is one compact implementation of it, sufficient
//! for simulating server behavior in tests. Paths are Unix-style and
//! absolute once resolved.

mod inmem;

pub use inmem::InMemoryFs;

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Read/write/execute bits of one filesystem entry.
///
/// The in-memory filesystem applies them uniformly to every principal;
/// implementations backed by richer models can differentiate per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    /// May list (directory) or retrieve (file).
    pub read: bool,
    /// May create, overwrite or remove children (directory) or store (file).
    pub write: bool,
    /// May change into (directory).
    pub execute: bool,
}

impl Permissions {
    /// Everything allowed; the default for new entries.
    pub const ALL: Permissions = Permissions {
        read: true,
        write: true,
        execute: true,
    };

    /// Read and traverse but never modify.
    pub const READ_ONLY: Permissions = Permissions {
        read: true,
        write: false,
        execute: true,
    };

    /// Everything denied.
    pub const NONE: Permissions = Permissions {
        read: false,
        write: false,
        execute: false,
    };

    /// The `rwx` triple as it appears in a directory listing.
    pub fn symbolic(&self) -> String {
        format!(
            "{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
        )
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::ALL
    }
}

/// What a [`VirtualFileSystem`] knows about one entry, as needed for LIST
/// output and permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Directory or regular file.
    pub is_directory: bool,
    /// Content length in bytes; 0 for directories.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// The entry's permission bits.
    pub permissions: Permissions,
    /// Owning principal, if any.
    pub owner: Option<String>,
}

/// Filesystem-condition errors. Handlers map each variant to the reply code
/// FTP mandates for the failing command, so the variants deliberately keep
/// "does not exist", "wrong kind" and "not empty" apart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsError {
    /// The path does not exist.
    #[error("{}: no such file or directory", .0.display())]
    NotFound(PathBuf),
    /// The path exists but is not a directory.
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// The path exists but is a directory.
    #[error("{}: is a directory", .0.display())]
    IsADirectory(PathBuf),
    /// The path already exists.
    #[error("{}: already exists", .0.display())]
    AlreadyExists(PathBuf),
    /// The directory still has children.
    #[error("{}: directory not empty", .0.display())]
    DirectoryNotEmpty(PathBuf),
}

/// Query/permission contract of the filesystem backing the fake server.
///
/// Mutating operations validate their own structural preconditions (parents
/// exist, targets are of the right kind) and report violations as
/// [`FsError`]; permission enforcement is the command handlers' job, via the
/// `can_*` predicates.
pub trait VirtualFileSystem: Send + Sync + fmt::Debug {
    /// Whether `path` exists at all.
    fn exists(&self, path: &Path) -> bool;
    /// Whether `path` exists and is a directory.
    fn is_directory(&self, path: &Path) -> bool;
    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;
    /// The parent directory of `path`; `None` at the root.
    fn parent(&self, path: &Path) -> Option<PathBuf>;
    /// Bare child names of the directory at `path`, sorted. Empty for
    /// missing paths; a file path yields its own name.
    fn list_names(&self, path: &Path) -> Vec<String>;
    /// Metadata of the entry at `path`.
    fn metadata(&self, path: &Path) -> Option<EntryMetadata>;
    /// The content of the regular file at `path`.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;
    /// Creates or overwrites the regular file at `path`.
    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), FsError>;
    /// Creates the directory at `path`; the parent must already exist.
    fn make_directory(&self, path: &Path) -> Result<(), FsError>;
    /// Removes the regular file at `path`.
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;
    /// Removes the empty directory at `path`.
    fn remove_directory(&self, path: &Path) -> Result<(), FsError>;
    /// Moves the entry at `from` (a directory moves with its subtree) to the
    /// not-yet-existing `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;
    /// Whether `principal` may read the entry at `path`.
    fn can_read(&self, path: &Path, principal: Option<&str>) -> bool;
    /// Whether `principal` may write the entry at `path`.
    fn can_write(&self, path: &Path, principal: Option<&str>) -> bool;
    /// Whether `principal` may traverse into the directory at `path`.
    fn can_execute(&self, path: &Path, principal: Option<&str>) -> bool;
}

/// Resolves a client-supplied path argument against a base directory:
/// absolute arguments stand alone, relative ones are joined, and `.`/`..`
/// segments are folded away (never escaping the root).
pub fn resolve(base: &Path, argument: &str) -> PathBuf {
    let raw = if argument.starts_with('/') {
        PathBuf::from(argument)
    } else {
        base.join(argument)
    };
    normalize(&raw)
}

pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {}
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_relative_against_base() {
        assert_eq!(resolve(Path::new("/home"), "docs"), PathBuf::from("/home/docs"));
    }

    #[test]
    fn resolve_absolute_ignores_base() {
        assert_eq!(resolve(Path::new("/home"), "/srv/files"), PathBuf::from("/srv/files"));
    }

    #[test]
    fn resolve_folds_dot_segments() {
        assert_eq!(resolve(Path::new("/home"), "./docs/../music"), PathBuf::from("/home/music"));
        assert_eq!(resolve(Path::new("/"), "../../etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn symbolic_permissions() {
        assert_eq!(Permissions::ALL.symbolic(), "rwx");
        assert_eq!(Permissions::READ_ONLY.symbolic(), "r-x");
        assert_eq!(Permissions::NONE.symbolic(), "---");
    }
}
