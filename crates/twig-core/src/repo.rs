//! Repository — the main entry point for twig operations.
//!
//! A Repository ties together the working tree, the staging index, the
//! object store and the branch refs. All state lives on disk under
//! `.twig/`; the struct itself is just the paths, so any number of
//! repositories can be open side by side.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::commit::Commit;
use crate::error::{TwigError, TwigResult};
use crate::graph;
use crate::hash::ObjectId;
use crate::index::Index;
use crate::merge::{self, FileAction, MergeOutcome, MergeReport};
use crate::refs::{normalize_branch_name, validate_branch_name};
use crate::remote::{self, FetchResult, PullResult, PushResult, RemoteConfig, RemoteEntry};
use crate::state::{self, Status};
use crate::store::{Store, STORE_DIR};
use crate::worktree::WorkTree;

/// Branch created by `init`.
pub const DEFAULT_BRANCH: &str = "master";

/// A twig repository.
#[derive(Debug, Clone)]
pub struct Repository {
    /// Root of the working tree (where `.twig/` lives).
    root: PathBuf,
    worktree: WorkTree,
    store: Store,
}

/// One commit in a log listing.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: ObjectId,
    #[serde(flatten)]
    pub commit: Commit,
}

impl Repository {
    /// Initialize a new repository in `root`.
    ///
    /// Creates `.twig/`, the root commit and the `master` branch.
    pub fn init(root: &Path) -> TwigResult<Self> {
        let store_dir = root.join(STORE_DIR);
        if store_dir.exists() {
            return Err(TwigError::AlreadyExists);
        }

        let store = Store::init(&store_dir)?;
        let root_id = store.save_commit(&Commit::root())?;
        store.refs.set_tip(DEFAULT_BRANCH, &root_id)?;
        store.refs.set_active(DEFAULT_BRANCH)?;
        Index::default().save(&store_dir.join("index.json"))?;
        info!(root = %root.display(), "initialized repository");

        Self::open(root)
    }

    /// Open an existing repository rooted at `root`.
    pub fn open(root: &Path) -> TwigResult<Self> {
        let store = Store::open(&root.join(STORE_DIR))?;
        Ok(Self {
            root: root.to_path_buf(),
            worktree: WorkTree::new(root),
            store,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn active_branch(&self) -> TwigResult<String> {
        self.store.refs.active_branch()
    }

    /// Id of the active branch's tip.
    pub fn head_id(&self) -> TwigResult<ObjectId> {
        self.store.refs.head()
    }

    pub fn load_commit(&self, id: &ObjectId) -> TwigResult<Commit> {
        self.store.load_commit(id)
    }

    /// The staging index as currently persisted.
    pub fn index(&self) -> TwigResult<Index> {
        Index::load(&self.index_path())
    }

    // --- Staging ---

    /// Stage the working-tree content of `name` for the next commit.
    ///
    /// Staging content identical to the active tip's version unstages the
    /// file instead.
    pub fn stage_add(&self, name: &str) -> TwigResult<()> {
        let content = self.worktree.read(name)?;
        let (_, head) = self.head()?;
        let mut index = self.index()?;

        let blob = ObjectId::of(&content);
        let committed = head.blob_for(name);
        if committed != Some(&blob) {
            self.store.blobs.put(&content)?;
        }
        index.stage_add(name, blob, committed);
        self.save_index(&index)?;
        debug!(file = name, staged = index.is_staged_for_addition(name), "add");
        Ok(())
    }

    /// Unstage `name`, and if the active tip tracks it, delete it from the
    /// working tree and stage its removal.
    pub fn stage_remove(&self, name: &str) -> TwigResult<()> {
        self.worktree.path_of(name)?;
        let (_, head) = self.head()?;
        let mut index = self.index()?;

        let tracked = head.tracks(name);
        if !index.stage_remove(name, tracked) {
            return Err(TwigError::NothingToRemove(name.to_string()));
        }
        if tracked {
            self.worktree.delete(name)?;
        }
        self.save_index(&index)?;
        debug!(file = name, tracked, "rm");
        Ok(())
    }

    // --- Commits ---

    /// Commit the staged changes on the active branch.
    pub fn commit(&self, message: &str) -> TwigResult<ObjectId> {
        self.create_commit(message, None)
    }

    /// Build a commit from the active tip plus the staging index, advance
    /// the active branch to it and clear the index.
    ///
    /// An empty index is only accepted for merge commits.
    fn create_commit(&self, message: &str, second_parent: Option<ObjectId>) -> TwigResult<ObjectId> {
        if message.trim().is_empty() {
            return Err(TwigError::EmptyMessage);
        }
        let mut index = self.index()?;
        if index.is_empty() && second_parent.is_none() {
            return Err(TwigError::EmptyCommit);
        }

        let branch = self.active_branch()?;
        let (parent_id, parent) = self.head()?;
        let staged = index.flush_and_clear();
        let commit = Commit::child(
            &parent,
            parent_id,
            second_parent,
            message.to_string(),
            &staged.additions,
            &staged.removals,
        );
        let id = self.store.save_commit(&commit)?;

        self.store.refs.set_tip(&branch, &id)?;
        self.save_index(&index)?;
        info!(
            commit = %id.short(),
            branch = %branch,
            added = staged.additions.len(),
            removed = staged.removals.len(),
            "created commit"
        );
        Ok(id)
    }

    /// History of the active branch along first parents, newest first.
    pub fn log(&self) -> TwigResult<Vec<LogEntry>> {
        let history = graph::first_parent_history(&self.store, &self.head_id()?)?;
        Ok(history
            .into_iter()
            .map(|(id, commit)| LogEntry { id, commit })
            .collect())
    }

    /// Every commit in the store, newest first.
    pub fn global_log(&self) -> TwigResult<Vec<LogEntry>> {
        let mut entries = Vec::new();
        for id in self.store.commits.ids()? {
            let commit = self.store.load_commit(&id)?;
            entries.push(LogEntry { id, commit });
        }
        entries.sort_by(|a, b| {
            b.commit
                .timestamp
                .cmp(&a.commit.timestamp)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    /// Ids of every commit whose message is exactly `message`.
    pub fn find(&self, message: &str) -> TwigResult<Vec<ObjectId>> {
        let matches: Vec<ObjectId> = self
            .global_log()?
            .into_iter()
            .filter(|entry| entry.commit.message == message)
            .map(|entry| entry.id)
            .collect();
        if matches.is_empty() {
            return Err(TwigError::NoCommitWithMessage(message.to_string()));
        }
        Ok(matches)
    }

    pub fn status(&self) -> TwigResult<Status> {
        let (_, head) = self.head()?;
        state::compute_status(
            &self.worktree,
            &self.index()?,
            &head,
            self.active_branch()?,
            self.store.refs.list()?,
        )
    }

    // --- Branches ---

    /// Create a branch at the active tip.
    pub fn create_branch(&self, name: &str) -> TwigResult<()> {
        let name = normalize_branch_name(name);
        validate_branch_name(&name)?;
        if self.store.refs.exists(&name) {
            return Err(TwigError::BranchExists(name));
        }
        self.store.refs.set_tip(&name, &self.head_id()?)?;
        info!(branch = %name, "created branch");
        Ok(())
    }

    /// Delete a branch pointer. Its commits stay in the store.
    pub fn delete_branch(&self, name: &str) -> TwigResult<()> {
        let name = normalize_branch_name(name);
        self.store.refs.delete(&name)?;
        info!(branch = %name, "deleted branch");
        Ok(())
    }

    pub fn branches(&self) -> TwigResult<Vec<String>> {
        self.store.refs.list()
    }

    /// Make `name` the active branch and check out its tip.
    pub fn checkout_branch(&self, name: &str) -> TwigResult<()> {
        let name = normalize_branch_name(name);
        let target_id = self.store.refs.tip(&name)?;
        if name == self.active_branch()? {
            return Err(TwigError::AlreadyOnBranch(name));
        }
        let (_, head) = self.head()?;
        let target = self.store.load_commit(&target_id)?;
        self.check_untracked(&head, target.files.iter())?;

        self.replace_tree(&head, &target)?;
        self.store.refs.set_active(&name)?;
        self.save_index(&Index::default())?;
        info!(branch = %name, "switched branch");
        Ok(())
    }

    /// Restore `name` in the working tree from the active tip.
    pub fn checkout_file(&self, name: &str) -> TwigResult<()> {
        let (_, head) = self.head()?;
        self.restore_file(&head, name)
    }

    /// Restore `name` in the working tree from commit `commit_id`
    /// (full or abbreviated).
    pub fn checkout_file_at(&self, commit_id: &str, name: &str) -> TwigResult<()> {
        let id = self.store.resolve_commit(commit_id)?;
        let commit = self.store.load_commit(&id)?;
        self.restore_file(&commit, name)
    }

    /// Move the active branch to `commit_id` and check it out.
    pub fn reset(&self, commit_id: &str) -> TwigResult<()> {
        let id = self.store.resolve_commit(commit_id)?;
        let (_, head) = self.head()?;
        let target = self.store.load_commit(&id)?;
        self.check_untracked(&head, target.files.iter())?;

        let branch = self.active_branch()?;
        self.replace_tree(&head, &target)?;
        self.store.refs.set_tip(&branch, &id)?;
        self.save_index(&Index::default())?;
        info!(branch = %branch, commit = %id.short(), "reset");
        Ok(())
    }

    // --- Merge ---

    /// Merge `given_branch` into the active branch.
    ///
    /// Every precondition is checked before anything is written, so a
    /// failed merge leaves the repository untouched.
    #[instrument(skip_all, fields(given = given_branch))]
    pub fn merge(&self, given_branch: &str) -> TwigResult<MergeReport> {
        if !self.index()?.is_empty() {
            return Err(TwigError::UncommittedChanges);
        }
        let given_branch = normalize_branch_name(given_branch);
        let given_id = self.store.refs.tip(&given_branch)?;
        let current_branch = self.active_branch()?;
        if given_branch == current_branch {
            return Err(TwigError::SelfMerge(given_branch));
        }
        let (current_id, current) = self.head()?;
        let given = self.store.load_commit(&given_id)?;

        let split_id = graph::split_point(&self.store, &current_id, &given_id)?;
        let report = |outcome| MergeReport {
            current_branch: current_branch.clone(),
            given_branch: given_branch.clone(),
            split_point: split_id.clone(),
            outcome,
        };

        if split_id.as_ref() == Some(&given_id) {
            info!("given branch is an ancestor of the current branch");
            return Ok(report(MergeOutcome::AlreadyMerged));
        }
        if split_id.as_ref() == Some(&current_id) {
            self.check_untracked(&current, given.files.iter())?;
            self.replace_tree(&current, &given)?;
            self.store.refs.set_tip(&current_branch, &given_id)?;
            info!(to = %given_id.short(), "fast-forwarded");
            return Ok(report(MergeOutcome::FastForward { to: given_id }));
        }

        let split = match &split_id {
            Some(id) => self.store.load_commit(id)?,
            None => Commit::root(),
        };
        let plan = merge::plan(&split.files, &current.files, &given.files);

        // Resolve every write up front so obstruction is detected before
        // the working tree changes.
        let mut writes: Vec<(String, Vec<u8>)> = Vec::new();
        let mut removals: Vec<String> = Vec::new();
        let mut conflicts: Vec<String> = Vec::new();
        for (name, action) in plan {
            debug!(file = %name, ?action, "classified");
            match action {
                FileAction::Keep => {}
                FileAction::TakeGiven(blob) => writes.push((name, self.store.blobs.get(&blob)?)),
                FileAction::Remove => removals.push(name),
                FileAction::Conflict { current, given } => {
                    let ours = self.blob_or_empty(current.as_ref())?;
                    let theirs = self.blob_or_empty(given.as_ref())?;
                    writes.push((name.clone(), merge::conflict_content(&ours, &theirs)));
                    conflicts.push(name);
                }
            }
        }
        let incoming: Vec<(String, ObjectId)> = writes
            .iter()
            .map(|(name, content)| (name.clone(), ObjectId::of(content)))
            .collect();
        self.check_untracked(&current, incoming.iter().map(|(n, id)| (n, id)))?;

        let mut index = Index::default();
        for (name, content) in &writes {
            let blob = self.store.blobs.put(content)?;
            self.worktree.write(name, content)?;
            index.additions.insert(name.clone(), blob);
        }
        for name in removals {
            self.worktree.delete(&name)?;
            index.removals.insert(name);
        }
        self.save_index(&index)?;

        let message = merge::merge_message(&given_branch, &current_branch);
        let commit = self.create_commit(&message, Some(given_id))?;
        for name in &conflicts {
            warn!(file = %name, "merge conflict");
        }
        Ok(report(MergeOutcome::Merged { commit, conflicts }))
    }

    // --- Remotes ---

    /// Register a remote under `name`.
    pub fn add_remote(&self, name: &str, path: &str) -> TwigResult<()> {
        let mut config = self.load_config()?;
        if config.remotes.contains_key(name) {
            return Err(TwigError::RemoteExists(name.to_string()));
        }
        config.remotes.insert(
            name.to_string(),
            RemoteEntry {
                path: path.to_string(),
            },
        );
        config.save(&self.config_path())
    }

    /// Forget the remote `name`. The remote itself is untouched.
    pub fn remove_remote(&self, name: &str) -> TwigResult<()> {
        let mut config = self.load_config()?;
        if config.remotes.remove(name).is_none() {
            return Err(TwigError::UnknownRemote(name.to_string()));
        }
        config.save(&self.config_path())
    }

    pub fn remotes(&self) -> TwigResult<Vec<(String, RemoteEntry)>> {
        Ok(self.load_config()?.remotes.into_iter().collect())
    }

    /// Copy the active branch's history to `remote_branch` on `remote_name`
    /// and advance that branch to the local tip.
    #[instrument(skip_all, fields(remote = remote_name, branch = remote_branch))]
    pub fn push(&self, remote_name: &str, remote_branch: &str) -> TwigResult<PushResult> {
        let remote_branch = &normalize_branch_name(remote_branch);
        validate_branch_name(remote_branch)?;
        let remote = self.remote_store(remote_name, true)?;
        let local_tip = self.head_id()?;
        let remote_tip = remote.refs.try_tip(remote_branch)?;

        if let Some(remote_tip) = &remote_tip {
            if !graph::is_ancestor(&self.store, remote_tip, &local_tip)? {
                return Err(TwigError::RemoteDivergence {
                    remote: remote_name.to_string(),
                    branch: remote_branch.to_string(),
                });
            }
        }

        let copied = remote::transfer(&self.store, &remote, &local_tip)?;
        let branch_updated = remote_tip.as_ref() != Some(&local_tip);
        if branch_updated {
            remote.refs.set_tip(remote_branch, &local_tip)?;
        }
        if remote.refs.active()?.is_none() {
            remote.refs.set_active(remote_branch)?;
        }
        info!(
            tip = %local_tip.short(),
            commits = copied.commits,
            blobs = copied.blobs,
            "pushed"
        );

        Ok(PushResult {
            remote: remote_name.to_string(),
            branch: remote_branch.to_string(),
            tip: local_tip,
            copied,
            branch_updated,
        })
    }

    /// Copy `remote_branch`'s history from `remote_name` and point the
    /// tracking branch `{remote}-{branch}` at its tip.
    ///
    /// The tracking branch must not be the checked-out one: moving it would
    /// leave the working tree and index describing a different commit.
    #[instrument(skip_all, fields(remote = remote_name, branch = remote_branch))]
    pub fn fetch(&self, remote_name: &str, remote_branch: &str) -> TwigResult<FetchResult> {
        let remote_branch = &normalize_branch_name(remote_branch);
        validate_branch_name(remote_branch)?;
        let tracking_branch = remote::tracking_branch(remote_name, remote_branch);
        validate_branch_name(&tracking_branch)?;
        if tracking_branch == self.active_branch()? {
            return Err(TwigError::FetchIntoActiveBranch(tracking_branch));
        }

        let remote = self.remote_store(remote_name, false)?;
        let tip = remote
            .refs
            .try_tip(remote_branch)?
            .ok_or_else(|| TwigError::UnknownRemoteBranch {
                remote: remote_name.to_string(),
                branch: remote_branch.to_string(),
            })?;

        let copied = remote::transfer(&remote, &self.store, &tip)?;
        self.store.refs.set_tip(&tracking_branch, &tip)?;
        info!(
            tip = %tip.short(),
            tracking = %tracking_branch,
            commits = copied.commits,
            blobs = copied.blobs,
            "fetched"
        );

        Ok(FetchResult {
            remote: remote_name.to_string(),
            branch: remote_branch.to_string(),
            tracking_branch,
            tip,
            copied,
        })
    }

    /// Fetch, then merge the tracking branch into the active branch.
    pub fn pull(&self, remote_name: &str, remote_branch: &str) -> TwigResult<PullResult> {
        if !self.index()?.is_empty() {
            return Err(TwigError::UncommittedChanges);
        }
        let fetch = self.fetch(remote_name, remote_branch)?;
        let merge = self.merge(&fetch.tracking_branch)?;
        Ok(PullResult { fetch, merge })
    }

    // --- Private helpers ---

    fn index_path(&self) -> PathBuf {
        self.store.dir().join("index.json")
    }

    fn config_path(&self) -> PathBuf {
        self.store.dir().join("config.json")
    }

    fn save_index(&self, index: &Index) -> TwigResult<()> {
        index.save(&self.index_path())
    }

    fn load_config(&self) -> TwigResult<RemoteConfig> {
        RemoteConfig::load(&self.config_path())
    }

    /// The active tip's id and commit.
    fn head(&self) -> TwigResult<(ObjectId, Commit)> {
        let id = self.head_id()?;
        let commit = self.store.load_commit(&id)?;
        Ok((id, commit))
    }

    /// Open the store behind a configured remote. Relative paths are taken
    /// from the working-tree root.
    fn remote_store(&self, name: &str, create: bool) -> TwigResult<Store> {
        let config = self.load_config()?;
        let entry = config
            .remotes
            .get(name)
            .ok_or_else(|| TwigError::UnknownRemote(name.to_string()))?;
        Store::open_remote(&self.root.join(&entry.path), create)
    }

    fn blob_or_empty(&self, id: Option<&ObjectId>) -> TwigResult<Vec<u8>> {
        match id {
            Some(id) => self.store.blobs.get(id),
            None => Ok(Vec::new()),
        }
    }

    fn restore_file(&self, commit: &Commit, name: &str) -> TwigResult<()> {
        let blob = commit
            .blob_for(name)
            .ok_or_else(|| TwigError::FileNotInCommit(name.to_string()))?;
        let content = self.store.blobs.get(blob)?;
        self.worktree.write(name, &content)
    }

    /// Fail if writing `incoming` would clobber a working file that
    /// `current` does not track. Files already holding the incoming
    /// content are not in the way.
    fn check_untracked<'a>(
        &self,
        current: &Commit,
        incoming: impl IntoIterator<Item = (&'a String, &'a ObjectId)>,
    ) -> TwigResult<()> {
        for (name, blob) in incoming {
            if current.tracks(name) || !self.worktree.exists(name)? {
                continue;
            }
            if ObjectId::of(&self.worktree.read(name)?) != *blob {
                return Err(TwigError::UntrackedObstruction(name.clone()));
            }
        }
        Ok(())
    }

    /// Rewrite the working tree from `from`'s snapshot to `to`'s.
    fn replace_tree(&self, from: &Commit, to: &Commit) -> TwigResult<()> {
        for (name, blob) in &to.files {
            let content = self.store.blobs.get(blob)?;
            self.worktree.write(name, &content)?;
        }
        for name in from.files.keys() {
            if !to.tracks(name) {
                self.worktree.delete(name)?;
            }
        }
        Ok(())
    }
}



#[cfg(test)]
mod remote_tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> ObjectId {
        fs::write(repo.root().join(name), content).unwrap();
        repo.stage_add(name).unwrap();
        repo.commit(message).unwrap()
    }

    fn history(repo: &Repository) -> Vec<ObjectId> {
        repo.log().unwrap().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_remote_add_and_remove() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        repo.add_remote("origin", "/tmp/somewhere").unwrap();
        assert!(matches!(
            repo.add_remote("origin", "/tmp/elsewhere"),
            Err(TwigError::RemoteExists(_))
        ));
        let remotes = repo.remotes().unwrap();
        assert_eq!(remotes.len(), 1);
        assert_eq!(remotes[0].1.path, "/tmp/somewhere");

        repo.remove_remote("origin").unwrap();
        assert!(repo.remotes().unwrap().is_empty());
        assert!(matches!(
            repo.remove_remote("origin"),
            Err(TwigError::UnknownRemote(_))
        ));
    }

    #[test]
    fn test_push_to_empty_remote_then_fetch_elsewhere() {
        let work = tempdir().unwrap();
        let remote = tempdir().unwrap();
        let third = tempdir().unwrap();

        let repo = Repository::init(work.path()).unwrap();
        commit_file(&repo, "a.txt", "a", "one");
        let tip = commit_file(&repo, "b.txt", "b", "two");
        repo.add_remote("origin", remote.path().to_str().unwrap())
            .unwrap();

        let pushed = repo.push("origin", "master").unwrap();
        assert!(pushed.branch_updated);
        assert_eq!(pushed.copied.commits, 3);
        assert_eq!(pushed.copied.blobs, 2);

        let bare = Store::open_remote(remote.path(), false).unwrap();
        assert_eq!(bare.refs.tip("master").unwrap(), tip);
        for id in history(&repo) {
            assert!(bare.commits.contains(&id));
        }

        let other = Repository::init(third.path()).unwrap();
        other
            .add_remote("origin", remote.path().to_str().unwrap())
            .unwrap();
        let fetched = other.fetch("origin", "master").unwrap();
        assert_eq!(fetched.tracking_branch, "origin-master");
        assert_eq!(fetched.tip, tip);

        let fetched_history: Vec<ObjectId> =
            graph::first_parent_history(other.store(), &fetched.tip)
                .unwrap()
                .into_iter()
                .map(|(id, _)| id)
                .collect();
        assert_eq!(fetched_history, history(&repo));

        other.checkout_branch("origin/master").unwrap();
        assert_eq!(fs::read_to_string(third.path().join("b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_push_again_is_incremental() {
        let work = tempdir().unwrap();
        let remote = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        repo.add_remote("origin", remote.path().to_str().unwrap())
            .unwrap();
        commit_file(&repo, "a.txt", "a", "one");
        repo.push("origin", "master").unwrap();

        let unchanged = repo.push("origin", "master").unwrap();
        assert!(!unchanged.branch_updated);
        assert_eq!(unchanged.copied.commits, 0);

        commit_file(&repo, "a.txt", "a2", "two");
        let next = repo.push("origin", "master").unwrap();
        assert!(next.branch_updated);
        assert_eq!(next.copied.commits, 1);
        assert_eq!(next.copied.blobs, 1);
    }

    #[test]
    fn test_push_rejects_divergent_remote() {
        let one = tempdir().unwrap();
        let two = tempdir().unwrap();
        let remote = tempdir().unwrap();
        let path = remote.path().to_str().unwrap();

        let repo1 = Repository::init(one.path()).unwrap();
        repo1.add_remote("origin", path).unwrap();
        let pushed_tip = commit_file(&repo1, "a.txt", "from one", "one");
        repo1.push("origin", "master").unwrap();

        let repo2 = Repository::init(two.path()).unwrap();
        repo2.add_remote("origin", path).unwrap();
        commit_file(&repo2, "a.txt", "from two", "two");

        assert!(matches!(
            repo2.push("origin", "master"),
            Err(TwigError::RemoteDivergence { .. })
        ));
        let bare = Store::open_remote(remote.path(), false).unwrap();
        assert_eq!(bare.refs.tip("master").unwrap(), pushed_tip);
    }

    #[test]
    fn test_push_to_missing_directory() {
        let work = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        repo.add_remote("origin", work.path().join("nowhere").to_str().unwrap())
            .unwrap();
        assert!(matches!(
            repo.push("origin", "master"),
            Err(TwigError::RemoteUnreachable(_))
        ));
        assert!(matches!(
            repo.push("upstream", "master"),
            Err(TwigError::UnknownRemote(_))
        ));
    }

    #[test]
    fn test_fetch_unknown_branch() {
        let work = tempdir().unwrap();
        let other = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        Repository::init(other.path()).unwrap();
        repo.add_remote("peer", other.path().to_str().unwrap())
            .unwrap();

        assert!(matches!(
            repo.fetch("peer", "nope"),
            Err(TwigError::UnknownRemoteBranch { .. })
        ));
        assert!(!repo.store().refs.exists("peer-nope"));
    }

    #[test]
    fn test_fetch_from_repository_updates_tracking_branch() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();

        let first = commit_file(&peer, "p.txt", "1", "peer one");
        assert_eq!(repo.fetch("peer", "master").unwrap().tip, first);
        let second = commit_file(&peer, "p.txt", "2", "peer two");
        repo.fetch("peer", "master").unwrap();
        assert_eq!(repo.store().refs.tip("peer-master").unwrap(), second);
    }

    #[test]
    fn test_pull_fast_forwards() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();
        let tip = commit_file(&peer, "p.txt", "peer", "peer work");

        let pulled = repo.pull("peer", "master").unwrap();
        assert_eq!(pulled.merge.outcome, MergeOutcome::FastForward { to: tip.clone() });
        assert_eq!(repo.head_id().unwrap(), tip);
        assert_eq!(fs::read_to_string(work.path().join("p.txt")).unwrap(), "peer");
    }

    #[test]
    fn test_pull_merges_diverged_history() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();
        let local_tip = commit_file(&repo, "local.txt", "l", "local work");
        let peer_tip = commit_file(&peer, "peer.txt", "p", "peer work");

        let pulled = repo.pull("peer", "master").unwrap();
        assert!(!pulled.merge.has_conflicts());
        let head = repo.load_commit(&repo.head_id().unwrap()).unwrap();
        assert_eq!(head.parent, Some(local_tip));
        assert_eq!(head.second_parent, Some(peer_tip));
        assert_eq!(head.message, "Merged peer-master into master.");
        assert!(work.path().join("peer.txt").exists());
    }

    #[test]
    fn test_pull_with_staged_changes_fetches_nothing() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();
        commit_file(&peer, "p.txt", "p", "peer work");

        fs::write(work.path().join("x.txt"), "x").unwrap();
        repo.stage_add("x.txt").unwrap();

        assert!(matches!(
            repo.pull("peer", "master"),
            Err(TwigError::UncommittedChanges)
        ));
        assert!(!repo.store().refs.exists("peer-master"));
    }

    #[test]
    fn test_push_rejects_escaping_branch_name() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let bare_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();
        repo.add_remote("bare", bare_dir.path().to_str().unwrap())
            .unwrap();
        commit_file(&repo, "a.txt", "a", "one");

        assert!(matches!(
            repo.push("peer", "../../escaped.txt"),
            Err(TwigError::InvalidBranchName(_))
        ));
        assert!(!peer_dir.path().join("escaped.txt").exists());
        assert_eq!(peer.branches().unwrap(), vec!["master"]);

        assert!(matches!(
            repo.push("bare", ".."),
            Err(TwigError::InvalidBranchName(_))
        ));
        assert_eq!(fs::read_dir(bare_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fetch_rejects_escaping_branch_name() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();

        assert!(matches!(
            repo.fetch("peer", "..\\x"),
            Err(TwigError::InvalidBranchName(_))
        ));
        assert_eq!(repo.branches().unwrap(), vec!["master"]);
    }

    #[test]
    fn test_pull_into_checked_out_tracking_branch_changes_nothing() {
        let work = tempdir().unwrap();
        let peer_dir = tempdir().unwrap();
        let repo = Repository::init(work.path()).unwrap();
        let peer = Repository::init(peer_dir.path()).unwrap();
        repo.add_remote("peer", peer_dir.path().to_str().unwrap())
            .unwrap();
        repo.fetch("peer", "master").unwrap();
        repo.checkout_branch("peer-master").unwrap();
        let head_before = repo.head_id().unwrap();
        let peer_tip = commit_file(&peer, "p.txt", "p", "peer work");

        assert!(matches!(
            repo.pull("peer", "master"),
            Err(TwigError::FetchIntoActiveBranch(_))
        ));
        assert!(matches!(
            repo.fetch("peer", "master"),
            Err(TwigError::FetchIntoActiveBranch(_))
        ));
        assert_eq!(repo.head_id().unwrap(), head_before);
        assert!(!repo.store().commits.contains(&peer_tip));
        assert!(repo.status().unwrap().is_clean());
    }
}
