//! Branch references and the active-branch selector.
//!
//! Each branch is a file `branches/<name>` holding a commit id; `HEAD`
//! holds the name of the active branch. Both are rewritten atomically.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TwigError, TwigResult};
use crate::fsutil::{atomic_write, read_trimmed};
use crate::hash::ObjectId;

/// Branch pointers of one store.
#[derive(Debug, Clone)]
pub struct Refs {
    branches_dir: PathBuf,
    head_path: PathBuf,
}

/// Map `origin/master` to the on-disk branch name `origin-master`.
pub fn normalize_branch_name(name: &str) -> String {
    name.replace('/', "-")
}

/// Reject names that would not map to a single file under `branches/`.
///
/// Separators, a leading dot, control characters and the `.tmp` suffix
/// used by atomic writes are all refused.
pub fn validate_branch_name(name: &str) -> TwigResult<()> {
    let forbidden = name.is_empty()
        || name.len() > 256
        || name.starts_with('.')
        || name.ends_with(".tmp")
        || name.contains(['/', '\\'])
        || name.bytes().any(|b| b < 0x20 || b == 0x7f);
    if forbidden {
        return Err(TwigError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

impl Refs {
    /// Refs of the store directory `store_dir`.
    pub fn new(store_dir: &Path) -> Self {
        Self {
            branches_dir: store_dir.join("branches"),
            head_path: store_dir.join("HEAD"),
        }
    }

    /// Tip of `name`, or `UnknownBranch`.
    pub fn tip(&self, name: &str) -> TwigResult<ObjectId> {
        self.try_tip(name)?
            .ok_or_else(|| TwigError::UnknownBranch(name.to_string()))
    }

    /// Tip of `name` if the branch exists.
    pub fn try_tip(&self, name: &str) -> TwigResult<Option<ObjectId>> {
        let Some(raw) = read_trimmed(&self.branch_path(name)?)? else {
            return Ok(None);
        };
        match ObjectId::parse(&raw) {
            Some(id) => Ok(Some(id)),
            None => Err(TwigError::NotFound(raw)),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.branch_path(name).is_ok_and(|path| path.is_file())
    }

    /// Point `name` at `id`, creating the branch if needed.
    pub fn set_tip(&self, name: &str, id: &ObjectId) -> TwigResult<()> {
        atomic_write(&self.branch_path(name)?, id.as_str().as_bytes())
    }

    /// Delete a branch. The active branch cannot be deleted.
    pub fn delete(&self, name: &str) -> TwigResult<()> {
        if self.active()?.as_deref() == Some(name) {
            return Err(TwigError::ActiveBranchDeletion(name.to_string()));
        }
        if !self.exists(name) {
            return Err(TwigError::UnknownBranch(name.to_string()));
        }
        fs::remove_file(self.branch_path(name)?)?;
        Ok(())
    }

    /// All branch names, sorted.
    pub fn list(&self) -> TwigResult<Vec<String>> {
        let mut names = Vec::new();
        if !self.branches_dir.is_dir() {
            return Ok(names);
        }
        for entry in fs::read_dir(&self.branches_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_file() && !name.ends_with(".tmp") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Name of the active branch (None in a fresh bare store).
    pub fn active(&self) -> TwigResult<Option<String>> {
        read_trimmed(&self.head_path)
    }

    /// Name of the active branch in a repository, where one always exists.
    pub fn active_branch(&self) -> TwigResult<String> {
        self.active()?.ok_or(TwigError::NotARepo)
    }

    pub fn set_active(&self, name: &str) -> TwigResult<()> {
        validate_branch_name(name)?;
        atomic_write(&self.head_path, name.as_bytes())
    }

    /// Tip of the active branch.
    pub fn head(&self) -> TwigResult<ObjectId> {
        self.tip(&self.active_branch()?)
    }

    fn branch_path(&self, name: &str) -> TwigResult<PathBuf> {
        validate_branch_name(name)?;
        Ok(self.branches_dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_and_read_tip() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(dir.path());
        let id = ObjectId::of(b"commit");

        assert!(refs.try_tip("master").unwrap().is_none());
        refs.set_tip("master", &id).unwrap();
        assert_eq!(refs.tip("master").unwrap(), id);
        assert!(refs.exists("master"));
    }

    #[test]
    fn test_unknown_branch() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(dir.path());
        assert!(matches!(refs.tip("nope"), Err(TwigError::UnknownBranch(_))));
    }

    #[test]
    fn test_delete_branch() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(dir.path());
        let id = ObjectId::of(b"c");
        refs.set_tip("master", &id).unwrap();
        refs.set_tip("topic", &id).unwrap();
        refs.set_active("master").unwrap();

        assert!(matches!(
            refs.delete("master"),
            Err(TwigError::ActiveBranchDeletion(_))
        ));
        assert!(matches!(refs.delete("ghost"), Err(TwigError::UnknownBranch(_))));
        refs.delete("topic").unwrap();
        assert_eq!(refs.list().unwrap(), vec!["master".to_string()]);
    }

    #[test]
    fn test_list_sorted() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(dir.path());
        let id = ObjectId::of(b"c");
        for name in ["zeta", "alpha", "mid"] {
            refs.set_tip(name, &id).unwrap();
        }
        assert_eq!(refs.list().unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_active_branch() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(dir.path());
        assert!(refs.active().unwrap().is_none());
        refs.set_active("master").unwrap();
        assert_eq!(refs.active_branch().unwrap(), "master");
    }

    #[test]
    fn test_normalize_branch_name() {
        assert_eq!(normalize_branch_name("origin/master"), "origin-master");
        assert_eq!(normalize_branch_name("topic"), "topic");
    }

    #[test]
    fn test_rejects_names_outside_branches_dir() {
        let dir = tempdir().unwrap();
        let refs = Refs::new(&dir.path().join("store"));
        let id = ObjectId::of(b"c");
        for bad in ["", ".", "..", "../x", "a/b", "a\\b", ".hidden", "x.tmp", "tab\there"] {
            assert!(
                matches!(refs.set_tip(bad, &id), Err(TwigError::InvalidBranchName(_))),
                "{bad:?} should be rejected"
            );
            assert!(!refs.exists(bad));
        }
        assert!(!dir.path().join("x").exists());
        assert!(matches!(
            refs.tip("../x"),
            Err(TwigError::InvalidBranchName(_))
        ));
        refs.set_tip("origin-master", &id).unwrap();
    }
}
