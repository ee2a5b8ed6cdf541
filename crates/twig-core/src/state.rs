//! Working tree status.
//!
//! Compares the working tree against the staging index and the active
//! tip to report staged, removed, modified and untracked files.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::commit::Commit;
use crate::error::TwigResult;
use crate::hash::ObjectId;
use crate::index::Index;
use crate::worktree::WorkTree;

/// Why a file shows up as "not staged for commit".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modification {
    /// Content differs from what is staged or committed.
    Modified,
    /// Missing from the working tree without a staged removal.
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnstagedChange {
    pub path: String,
    pub kind: Modification,
}

/// Full status report. Every list is sorted by path.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub active_branch: String,
    /// All branches including the active one.
    pub branches: Vec<String>,
    pub staged: Vec<String>,
    pub removed: Vec<String>,
    pub unstaged: Vec<UnstagedChange>,
    pub untracked: Vec<String>,
}

impl Status {
    /// True if nothing is staged, modified or untracked.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
    }

    /// One-line summary.
    pub fn brief(&self) -> String {
        if self.is_clean() {
            return format!("{}: clean", self.active_branch);
        }
        let counts = [
            (self.staged.len(), "staged"),
            (self.removed.len(), "removed"),
            (self.unstaged.len(), "unstaged"),
            (self.untracked.len(), "untracked"),
        ];
        let parts: Vec<String> = counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, label)| format!("{n}-{label}"))
            .collect();
        format!("{}: {}", self.active_branch, parts.join(","))
    }
}

/// Compute status of `tree` against `index` and the active tip `head`.
pub fn compute_status(
    tree: &WorkTree,
    index: &Index,
    head: &Commit,
    active_branch: String,
    branches: Vec<String>,
) -> TwigResult<Status> {
    let mut on_disk: BTreeMap<String, ObjectId> = BTreeMap::new();
    for name in tree.list()? {
        let content = tree.read(&name)?;
        on_disk.insert(name, ObjectId::of(&content));
    }

    let mut unstaged = Vec::new();
    let mut note = |path: &str, kind: Modification| {
        unstaged.push(UnstagedChange {
            path: path.to_string(),
            kind,
        })
    };

    for (name, staged_id) in &index.additions {
        match on_disk.get(name) {
            None => note(name, Modification::Deleted),
            Some(disk_id) if disk_id != staged_id => note(name, Modification::Modified),
            Some(_) => {}
        }
    }
    for (name, committed_id) in &head.files {
        if index.is_staged_for_addition(name) || index.is_staged_for_removal(name) {
            continue;
        }
        match on_disk.get(name) {
            None => note(name, Modification::Deleted),
            Some(disk_id) if disk_id != committed_id => note(name, Modification::Modified),
            Some(_) => {}
        }
    }
    unstaged.sort_by(|a, b| a.path.cmp(&b.path));

    let untracked = on_disk
        .keys()
        .filter(|name| {
            index.is_staged_for_removal(name)
                || (!head.tracks(name) && !index.is_staged_for_addition(name))
        })
        .cloned()
        .collect();

    Ok(Status {
        active_branch,
        branches,
        staged: index.additions.keys().cloned().collect(),
        removed: index.removals.iter().cloned().collect(),
        unstaged,
        untracked,
    })
}
