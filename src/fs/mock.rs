// src/fs/mock.rs

use super::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for exercising report and config-file edge cases
/// (unreadable files, read-only directories) without touching the disk.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
    read_only: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.lock_entries();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        insert_dirs(&mut self.lock_entries(), path.as_ref());
    }

    /// Reads of this file fail with `PermissionDenied`.
    pub fn mark_unreadable(&self, path: impl AsRef<Path>) {
        lock(&self.unreadable).insert(path.as_ref().to_path_buf());
    }

    /// Nothing can be created inside this directory.
    pub fn mark_read_only(&self, path: impl AsRef<Path>) {
        lock(&self.read_only).insert(path.as_ref().to_path_buf());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.lock_entries().get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        lock(&self.entries)
    }

    fn is_read_only(&self, dir: &Path) -> bool {
        lock(&self.read_only).contains(dir)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn insert_dirs(entries: &mut HashMap<PathBuf, MockEntry>, dir: &Path) {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {:?}", path),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if lock(&self.unreadable).contains(path) {
            return Err(denied(path));
        }
        match self.lock_entries().get(path) {
            Some(MockEntry::File(content)) => String::from_utf8(content.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Some(MockEntry::Dir) => Err(io::Error::other(format!("is a directory: {:?}", path))),
            None => Err(not_found(path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock_entries().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(path), Some(MockEntry::Dir))
    }

    fn is_writable_dir(&self, path: &Path) -> bool {
        self.is_dir(path) && !self.is_read_only(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if let Some(blocked) = path.ancestors().find(|a| self.is_read_only(a)) {
            if !self.is_dir(path) {
                return Err(denied(blocked));
            }
        }
        if self.is_file(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {:?}", path),
            ));
        }
        self.add_dir(path);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        if lock(&self.unreadable).contains(from) {
            return Err(denied(from));
        }
        let content = self.contents(from).ok_or_else(|| not_found(from))?;
        if let Some(parent) = to.parent() {
            if !self.is_dir(parent) {
                return Err(not_found(parent));
            }
            if self.is_read_only(parent) {
                return Err(denied(parent));
            }
        }
        let len = content.len() as u64;
        self.lock_entries()
            .insert(to.to_path_buf(), MockEntry::File(content));
        Ok(len)
    }
}
