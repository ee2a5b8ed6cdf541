//! Three-way merge planning.
//!
//! Compares the split-point, current and given snapshots file by file and
//! decides what happens to each file. Nothing here touches disk; the
//! repository applies the plan (see `Repository::merge`).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::hash::ObjectId;

/// What a merge does to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Leave the current version (or absence) as it is.
    Keep,
    /// Only `given` changed it: write and stage the given blob.
    TakeGiven(ObjectId),
    /// Only `given` changed it, by deleting it: stage a removal.
    Remove,
    /// Both sides changed it differently.
    Conflict {
        current: Option<ObjectId>,
        given: Option<ObjectId>,
    },
}

/// Classify one file from its blob id at the split point, in `current` and
/// in `given`. `None` means the file is not tracked at that point.
pub fn classify(
    split: Option<&ObjectId>,
    current: Option<&ObjectId>,
    given: Option<&ObjectId>,
) -> FileAction {
    if current == given || given == split {
        return FileAction::Keep;
    }
    if current == split {
        return match given {
            Some(id) => FileAction::TakeGiven(id.clone()),
            None => FileAction::Remove,
        };
    }
    FileAction::Conflict {
        current: current.cloned(),
        given: given.cloned(),
    }
}

/// Classify every file in the union of the three snapshots.
///
/// Files whose action is [`FileAction::Keep`] are left out.
pub fn plan(
    split: &BTreeMap<String, ObjectId>,
    current: &BTreeMap<String, ObjectId>,
    given: &BTreeMap<String, ObjectId>,
) -> BTreeMap<String, FileAction> {
    let names: BTreeSet<&String> = split.keys().chain(current.keys()).chain(given.keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let action = classify(split.get(name), current.get(name), given.get(name));
            (action != FileAction::Keep).then(|| (name.clone(), action))
        })
        .collect()
}

/// Content written for a conflicted file. A missing side contributes
/// nothing between its markers.
pub fn conflict_content(current: &[u8], given: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(current.len() + given.len() + 32);
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    out.extend_from_slice(current);
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(given);
    out.extend_from_slice(b">>>>>>>\n");
    out
}

/// Message of the commit a merge creates.
pub fn merge_message(given_branch: &str, current_branch: &str) -> String {
    format!("Merged {given_branch} into {current_branch}.")
}

/// How a merge ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MergeOutcome {
    /// The given tip is already in the current history; nothing changed.
    AlreadyMerged,
    /// The current branch was moved forward to the given tip.
    FastForward { to: ObjectId },
    /// A merge commit was created. `conflicts` lists files written with
    /// conflict markers.
    Merged {
        commit: ObjectId,
        conflicts: Vec<String>,
    },
}

/// Result of `Repository::merge`.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub current_branch: String,
    pub given_branch: String,
    /// `None` when the two histories share no commit.
    pub split_point: Option<ObjectId>,
    pub outcome: MergeOutcome,
}

impl MergeReport {
    pub fn has_conflicts(&self) -> bool {
        matches!(&self.outcome, MergeOutcome::Merged { conflicts, .. } if !conflicts.is_empty())
    }
}
