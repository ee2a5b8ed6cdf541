//! Content-addressable object store.
//!
//! Objects are stored under a namespace root using a 2-character prefix
//! directory scheme (like git). Each object is identified by the SHA-256
//! of its bytes and stored verbatim. The store is append-only: nothing is
//! ever rewritten or deleted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TwigError, TwigResult};
use crate::fsutil::atomic_write;
use crate::hash::ObjectId;

/// One object namespace on disk (`objects/blobs/` or `objects/commits/`).
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Create an ObjectStore rooted at the given path.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Store bytes and return their content id.
    ///
    /// If the object already exists this is a no-op returning the same id.
    pub fn put(&self, data: &[u8]) -> TwigResult<ObjectId> {
        let id = ObjectId::of(data);
        let path = self.object_path(&id);
        if !path.exists() {
            atomic_write(&path, data)?;
        }
        Ok(id)
    }

    /// Retrieve an object by id.
    pub fn get(&self, id: &ObjectId) -> TwigResult<Vec<u8>> {
        let path = self.object_path(id);
        if !path.exists() {
            return Err(TwigError::NotFound(id.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// Every id in this namespace, sorted.
    pub fn ids(&self) -> TwigResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        if !self.root.is_dir() {
            return Ok(ids);
        }
        for prefix_entry in fs::read_dir(&self.root)? {
            let prefix_entry = prefix_entry?;
            if !prefix_entry.file_type()?.is_dir() {
                continue;
            }
            let prefix = prefix_entry.file_name().to_string_lossy().to_string();
            for obj_entry in fs::read_dir(prefix_entry.path())? {
                let rest = obj_entry?.file_name().to_string_lossy().to_string();
                // Skips leftover `.tmp` files from an interrupted write.
                if let Some(id) = ObjectId::parse(&format!("{prefix}{rest}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Number of stored objects.
    pub fn len(&self) -> TwigResult<usize> {
        Ok(self.ids()?.len())
    }

    pub fn is_empty(&self) -> TwigResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Hash `abcdef...` lives at `ab/cdef...`.
    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (prefix, rest) = id.as_str().split_at(2);
        self.root.join(prefix).join(rest)
    }
}
