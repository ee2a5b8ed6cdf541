//! The working tree: the user's files next to `.twig/`.
//!
//! File names are `/`-separated paths relative to the tree root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{TwigError, TwigResult};
use crate::store::STORE_DIR;

#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a relative file name and return its absolute path.
    ///
    /// Rejects empty names, absolute paths, `..` components and anything
    /// inside the store directory.
    pub fn path_of(&self, name: &str) -> TwigResult<PathBuf> {
        let rel = Path::new(name);
        let first_is_store = matches!(
            rel.components().next(),
            Some(Component::Normal(c)) if c.to_str() == Some(STORE_DIR)
        );
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes || first_is_store {
            return Err(TwigError::PathTraversal(name.to_string()));
        }
        Ok(self.root.join(rel))
    }

    pub fn exists(&self, name: &str) -> TwigResult<bool> {
        Ok(self.path_of(name)?.is_file())
    }

    /// Contents of `name`, or `FileNotFound`.
    pub fn read(&self, name: &str) -> TwigResult<Vec<u8>> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(TwigError::FileNotFound(name.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Write `name`, creating parent directories.
    pub fn write(&self, name: &str, data: &[u8]) -> TwigResult<()> {
        let path = self.path_of(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    /// Delete `name` if present, pruning directories it leaves empty.
    pub fn delete(&self, name: &str) -> TwigResult<()> {
        let path = self.path_of(name)?;
        if path.is_file() {
            fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent() {
            let _ = remove_empty_dirs(parent, &self.root);
        }
        Ok(())
    }

    /// Every file in the tree outside `.twig/`, sorted.
    pub fn list(&self) -> TwigResult<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == STORE_DIR));
        for entry in walker {
            let entry = entry.map_err(|e| TwigError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                let name: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                files.push(name.join("/"));
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Remove `dir` and its parents while they are empty, stopping at `stop_at`.
fn remove_empty_dirs(dir: &Path, stop_at: &Path) -> std::io::Result<()> {
    let mut current = dir.to_path_buf();
    while current != stop_at && current.starts_with(stop_at) {
        if fs::read_dir(&current)?.next().is_some() {
            break;
        }
        fs::remove_dir(&current)?;
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    Ok(())
}
