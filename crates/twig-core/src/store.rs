//! A store directory: both object namespaces plus the branch refs.
//!
//! A repository's `.twig/` is a store; so is a bare push target. Two
//! stores at different paths share nothing until objects are copied
//! between them.

use std::fs;
use std::path::{Path, PathBuf};

use crate::commit::Commit;
use crate::error::{TwigError, TwigResult};
use crate::graph::CommitSource;
use crate::hash::ObjectId;
use crate::object::ObjectStore;
use crate::refs::Refs;

/// The `.twig` directory name.
pub const STORE_DIR: &str = ".twig";

#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    /// File contents.
    pub blobs: ObjectStore,
    /// Serialized commits.
    pub commits: ObjectStore,
    pub refs: Refs,
}

impl Store {
    fn at(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            blobs: ObjectStore::new(&dir.join("objects").join("blobs")),
            commits: ObjectStore::new(&dir.join("objects").join("commits")),
            refs: Refs::new(dir),
        }
    }

    /// Lay out an empty store at `dir` (no commits, no branches).
    pub fn init(dir: &Path) -> TwigResult<Self> {
        fs::create_dir_all(dir.join("objects").join("blobs"))?;
        fs::create_dir_all(dir.join("objects").join("commits"))?;
        fs::create_dir_all(dir.join("branches"))?;
        if !dir.join("HEAD").exists() {
            fs::write(dir.join("HEAD"), "")?;
        }
        Ok(Self::at(dir))
    }

    /// Open an existing store directory.
    pub fn open(dir: &Path) -> TwigResult<Self> {
        if !Self::is_store(dir) {
            return Err(TwigError::NotARepo);
        }
        Ok(Self::at(dir))
    }

    /// Open the store a remote path refers to.
    ///
    /// `path` may be a store directory or a working tree containing
    /// `.twig/`. With `create`, an existing directory that holds neither
    /// is initialised as a bare store.
    pub fn open_remote(path: &Path, create: bool) -> TwigResult<Self> {
        let unreachable = || TwigError::RemoteUnreachable(path.display().to_string());
        if !path.is_dir() {
            return Err(unreachable());
        }
        let nested = path.join(STORE_DIR);
        if Self::is_store(&nested) {
            return Ok(Self::at(&nested));
        }
        if Self::is_store(path) {
            return Ok(Self::at(path));
        }
        if create && fs::read_dir(path)?.next().is_none() {
            return Self::init(path);
        }
        Err(unreachable())
    }

    fn is_store(dir: &Path) -> bool {
        dir.join("objects").is_dir() && dir.join("branches").is_dir()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_commit(&self, id: &ObjectId) -> TwigResult<Commit> {
        Commit::decode(&self.commits.get(id)?)
    }

    pub fn save_commit(&self, commit: &Commit) -> TwigResult<ObjectId> {
        self.commits.put(&commit.encode()?)
    }

    /// Resolve a full or abbreviated commit id.
    pub fn resolve_commit(&self, prefix: &str) -> TwigResult<ObjectId> {
        if let Some(id) = ObjectId::parse(prefix) {
            if self.commits.contains(&id) {
                return Ok(id);
            }
            return Err(TwigError::UnknownCommit(prefix.to_string()));
        }
        if prefix.is_empty() {
            return Err(TwigError::UnknownCommit(prefix.to_string()));
        }
        let mut matches: Vec<ObjectId> = self
            .commits
            .ids()?
            .into_iter()
            .filter(|id| id.as_str().starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Err(TwigError::UnknownCommit(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(TwigError::AmbiguousCommitId(prefix.to_string(), n)),
        }
    }
}

impl CommitSource for Store {
    fn commit(&self, id: &ObjectId) -> TwigResult<Commit> {
        self.load_commit(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_layout() {
        let dir = tempdir().unwrap();
        Store::init(dir.path()).unwrap();
        assert!(dir.path().join("objects/blobs").is_dir());
        assert!(dir.path().join("objects/commits").is_dir());
        assert!(dir.path().join("branches").is_dir());
        assert!(dir.path().join("HEAD").exists());
    }

    #[test]
    fn test_open_requires_layout() {
        let dir = tempdir().unwrap();
        assert!(matches!(Store::open(dir.path()), Err(TwigError::NotARepo)));
    }

    #[test]
    fn test_save_and_load_commit() {
        let dir = tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        let id = store.save_commit(&Commit::root()).unwrap();
        assert_eq!(id, Commit::root().id().unwrap());
        assert_eq!(store.load_commit(&id).unwrap(), Commit::root());
    }

    #[test]
    fn test_resolve_commit_prefix() {
        let dir = tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        let id = store.save_commit(&Commit::root()).unwrap();

        assert_eq!(store.resolve_commit(&id.as_str()[..6]).unwrap(), id);
        assert_eq!(store.resolve_commit(id.as_str()).unwrap(), id);
        assert!(matches!(
            store.resolve_commit("zzzz"),
            Err(TwigError::UnknownCommit(_))
        ));
    }

    #[test]
    fn test_resolve_commit_does_not_match_blobs() {
        let dir = tempdir().unwrap();
        let store = Store::init(dir.path()).unwrap();
        let blob = store.blobs.put(b"file").unwrap();
        assert!(matches!(
            store.resolve_commit(blob.as_str()),
            Err(TwigError::UnknownCommit(_))
        ));
    }

    #[test]
    fn test_open_remote_variants() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing");
        assert!(matches!(
            Store::open_remote(&missing, true),
            Err(TwigError::RemoteUnreachable(_))
        ));

        let worktree = dir.path().join("work");
        Store::init(&worktree.join(STORE_DIR)).unwrap();
        let store = Store::open_remote(&worktree, false).unwrap();
        assert_eq!(store.dir(), worktree.join(STORE_DIR));

        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        assert!(matches!(
            Store::open_remote(&empty, false),
            Err(TwigError::RemoteUnreachable(_))
        ));
        Store::open_remote(&empty, true).unwrap();
        assert!(empty.join("objects/commits").is_dir());
    }
}
