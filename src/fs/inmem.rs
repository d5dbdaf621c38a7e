//! A compact in-memory filesystem, the default backing store of the fake
//! server variant.

use super::{EntryMetadata, FsError, Permissions, VirtualFileSystem, normalize};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    permissions: Permissions,
    owner: Option<String>,
    modified: DateTime<Utc>,
}

impl Entry {
    fn directory() -> Self {
        Entry {
            node: Node::Directory,
            permissions: Permissions::ALL,
            owner: None,
            modified: Utc::now(),
        }
    }

    fn file(content: Vec<u8>) -> Self {
        Entry {
            node: Node::File(content),
            permissions: Permissions::ALL,
            owner: None,
            modified: Utc::now(),
        }
    }

    fn is_directory(&self) -> bool {
        matches!(self.node, Node::Directory)
    }
}

/// In-memory [`VirtualFileSystem`] keyed on normalized absolute paths.
///
/// The root directory `/` always exists. The setup helpers
/// ([`add_directory`](Self::add_directory), [`add_file`](Self::add_file))
/// create missing parent directories on the fly so tests can sketch a tree
/// in a couple of lines; the `VirtualFileSystem` operations themselves are
/// strict, the way the protocol demands.
#[derive(Debug)]
pub struct InMemoryFs {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
}

impl InMemoryFs {
    /// Creates a filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::directory());
        InMemoryFs {
            entries: RwLock::new(entries),
        }
    }

    /// Adds a directory, creating missing parents.
    pub fn add_directory<P: AsRef<Path>>(&self, path: P) -> Result<(), FsError> {
        let path = normalize(path.as_ref());
        let mut entries = self.write();
        Self::ensure_directory(&mut entries, &path)
    }

    /// Adds a regular file with the given content, creating missing parent
    /// directories.
    pub fn add_file<P: AsRef<Path>, C: Into<Vec<u8>>>(&self, path: P, content: C) -> Result<(), FsError> {
        let path = normalize(path.as_ref());
        let mut entries = self.write();
        if let Some(parent) = path.parent() {
            Self::ensure_directory(&mut entries, parent)?;
        }
        match entries.get(&path) {
            Some(entry) if entry.is_directory() => return Err(FsError::IsADirectory(path)),
            _ => {}
        }
        entries.insert(path, Entry::file(content.into()));
        Ok(())
    }

    /// Replaces the permission bits of an existing entry.
    pub fn set_permissions<P: AsRef<Path>>(&self, path: P, permissions: Permissions) -> Result<(), FsError> {
        let path = normalize(path.as_ref());
        let mut entries = self.write();
        let entry = entries.get_mut(&path).ok_or(FsError::NotFound(path))?;
        entry.permissions = permissions;
        Ok(())
    }

    /// Sets the owning principal of an existing entry.
    pub fn set_owner<P: AsRef<Path>>(&self, path: P, owner: &str) -> Result<(), FsError> {
        let path = normalize(path.as_ref());
        let mut entries = self.write();
        let entry = entries.get_mut(&path).ok_or(FsError::NotFound(path))?;
        entry.owner = Some(owner.to_string());
        Ok(())
    }

    fn ensure_directory(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) -> Result<(), FsError> {
        let mut current = PathBuf::from("/");
        for component in path.components().skip(1) {
            current.push(component);
            match entries.get(&current) {
                Some(entry) if entry.is_directory() => continue,
                Some(_) => return Err(FsError::NotADirectory(current)),
                None => {}
            }
            entries.insert(current.clone(), Entry::directory());
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryFs {
    fn default() -> Self {
        InMemoryFs::new()
    }
}

impl VirtualFileSystem for InMemoryFs {
    fn exists(&self, path: &Path) -> bool {
        self.read().contains_key(path)
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.read().get(path).map(Entry::is_directory).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.read().get(path).map(|e| !e.is_directory()).unwrap_or(false)
    }

    fn parent(&self, path: &Path) -> Option<PathBuf> {
        path.parent().map(Path::to_path_buf)
    }

    fn list_names(&self, path: &Path) -> Vec<String> {
        let entries = self.read();
        match entries.get(path) {
            Some(entry) if !entry.is_directory() => path
                .file_name()
                .map(|name| vec![name.to_string_lossy().into_owned()])
                .unwrap_or_default(),
            Some(_) => entries
                .keys()
                .filter(|candidate| candidate.parent() == Some(path))
                .filter_map(|candidate| candidate.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect(),
            None => Vec::new(),
        }
    }

    fn metadata(&self, path: &Path) -> Option<EntryMetadata> {
        self.read().get(path).map(|entry| EntryMetadata {
            is_directory: entry.is_directory(),
            size: match &entry.node {
                Node::Directory => 0,
                Node::File(content) => content.len() as u64,
            },
            modified: entry.modified,
            permissions: entry.permissions,
            owner: entry.owner.clone(),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        match self.read().get(path) {
            None => Err(FsError::NotFound(path.to_path_buf())),
            Some(entry) => match &entry.node {
                Node::Directory => Err(FsError::IsADirectory(path.to_path_buf())),
                Node::File(content) => Ok(content.clone()),
            },
        }
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), FsError> {
        let mut entries = self.write();
        let parent = path.parent().ok_or_else(|| FsError::IsADirectory(path.to_path_buf()))?;
        match entries.get(parent) {
            None => return Err(FsError::NotFound(parent.to_path_buf())),
            Some(entry) if !entry.is_directory() => return Err(FsError::NotADirectory(parent.to_path_buf())),
            Some(_) => {}
        }
        if let Some(entry) = entries.get_mut(path) {
            if entry.is_directory() {
                return Err(FsError::IsADirectory(path.to_path_buf()));
            }
            // Overwrite keeps the entry's permissions and owner.
            entry.node = Node::File(content.to_vec());
            entry.modified = Utc::now();
            return Ok(());
        }
        entries.insert(path.to_path_buf(), Entry::file(content.to_vec()));
        Ok(())
    }

    fn make_directory(&self, path: &Path) -> Result<(), FsError> {
        let mut entries = self.write();
        if entries.contains_key(path) {
            return Err(FsError::AlreadyExists(path.to_path_buf()));
        }
        let parent = path.parent().ok_or_else(|| FsError::AlreadyExists(path.to_path_buf()))?;
        match entries.get(parent) {
            None => return Err(FsError::NotFound(parent.to_path_buf())),
            Some(entry) if !entry.is_directory() => return Err(FsError::NotADirectory(parent.to_path_buf())),
            Some(_) => {}
        }
        entries.insert(path.to_path_buf(), Entry::directory());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let mut entries = self.write();
        match entries.get(path) {
            None => return Err(FsError::NotFound(path.to_path_buf())),
            Some(entry) if entry.is_directory() => return Err(FsError::IsADirectory(path.to_path_buf())),
            Some(_) => {}
        }
        entries.remove(path);
        Ok(())
    }

    fn remove_directory(&self, path: &Path) -> Result<(), FsError> {
        let mut entries = self.write();
        match entries.get(path) {
            None => return Err(FsError::NotFound(path.to_path_buf())),
            Some(entry) if !entry.is_directory() => return Err(FsError::NotADirectory(path.to_path_buf())),
            Some(_) => {}
        }
        let has_children = entries.keys().any(|candidate| candidate.parent() == Some(path));
        if has_children {
            return Err(FsError::DirectoryNotEmpty(path.to_path_buf()));
        }
        entries.remove(path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let mut entries = self.write();
        if !entries.contains_key(from) {
            return Err(FsError::NotFound(from.to_path_buf()));
        }
        if entries.contains_key(to) {
            return Err(FsError::AlreadyExists(to.to_path_buf()));
        }
        let to_parent = to.parent().ok_or_else(|| FsError::AlreadyExists(to.to_path_buf()))?;
        match entries.get(to_parent) {
            None => return Err(FsError::NotFound(to_parent.to_path_buf())),
            Some(entry) if !entry.is_directory() => return Err(FsError::NotADirectory(to_parent.to_path_buf())),
            Some(_) => {}
        }

        // A directory takes its whole subtree along.
        let moved: Vec<PathBuf> = entries
            .keys()
            .filter(|candidate| candidate.as_path() == from || candidate.starts_with(from))
            .cloned()
            .collect();
        for old_path in moved {
            if let Some(mut entry) = entries.remove(&old_path) {
                let new_path = match old_path.strip_prefix(from) {
                    Ok(rest) if rest.as_os_str().is_empty() => to.to_path_buf(),
                    Ok(rest) => to.join(rest),
                    Err(_) => old_path,
                };
                entry.modified = Utc::now();
                entries.insert(new_path, entry);
            }
        }
        Ok(())
    }

    fn can_read(&self, path: &Path, _principal: Option<&str>) -> bool {
        self.read().get(path).map(|e| e.permissions.read).unwrap_or(false)
    }

    fn can_write(&self, path: &Path, _principal: Option<&str>) -> bool {
        self.read().get(path).map(|e| e.permissions.write).unwrap_or(false)
    }

    fn can_execute(&self, path: &Path, _principal: Option<&str>) -> bool {
        self.read().get(path).map(|e| e.permissions.execute).unwrap_or(false)
    }
}
