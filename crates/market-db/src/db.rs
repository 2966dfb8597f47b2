//! Snapshot file handle.

use crate::DbError;
use fs4::fs_std::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A single JSON document on disk.
///
/// Every save writes a fresh temp file in the same directory and renames it
/// over the target, so readers see either the old document or the new one,
/// never a torn write. Read-modify-write cycles that must not interleave
/// with other processes hold [`Db::lock`] for their whole duration.
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
    dir: PathBuf,
}

/// Exclusive advisory lock on a [`Db`], held until dropped.
///
/// The lock lives on a sibling `<file>.lock` so it survives the rename done
/// by [`Db::save`]. It is released when the guard drops or the process exits.
#[derive(Debug)]
pub struct DbLock {
    file: File,
    path: PathBuf,
}

impl DbLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DbLock {
    fn drop(&mut self) {
        // Closing the file releases the lock as well.
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "store lock released");
    }
}

impl Db {
    /// Open a snapshot file, creating its parent directory if needed.
    ///
    /// The file itself is not created until the first [`Db::save`].
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Db::open(".market/marketplace.json")?;
    /// ```
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let path = path.into();
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|source| DbError::OpenError {
                    path: parent.to_path_buf(),
                    source,
                })?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };
        Ok(Self { path, dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a document has been saved.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load and deserialize the document.
    ///
    /// Returns `None` if nothing has been saved yet.
    pub fn load_as<T: DeserializeOwned>(&self) -> Result<Option<T>, DbError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let value = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot loaded");
        Ok(Some(value))
    }

    /// Serialize `value` and atomically replace the document.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| DbError::SerializeError(e.to_string()))?;

        // The temp file is unique per call and deleted on drop if never
        // persisted.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| self.io_error(e))?;
        let write = |tmp: &mut NamedTempFile| -> std::io::Result<()> {
            tmp.write_all(&json)?;
            tmp.write_all(b"\n")?;
            tmp.as_file().sync_all()
        };
        write(&mut tmp).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    /// Delete the document. Returns whether there was one.
    pub fn remove(&self) -> Result<bool, DbError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Block until this process holds the store exclusively.
    ///
    /// Other handles on the same file, in this process or another, wait in
    /// their own `lock` call until the returned guard is dropped.
    pub fn lock(&self) -> Result<DbLock, DbError> {
        let path = self.lock_path();
        let lock_error = |source| DbError::Lock {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_error)?;
        FileExt::lock_exclusive(&file).map_err(lock_error)?;
        debug!(path = %path.display(), "store lock acquired");
        Ok(DbLock { file, path })
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> DbError {
        DbError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
