//! Commits — immutable snapshots of the tracked files.
//!
//! A commit records a message, a timestamp, up to two parents and the full
//! filename → blob-id mapping of the tree. It is stored as JSON in the
//! commit namespace and its id is the hash of that JSON, so two commits
//! with identical fields are the same commit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TwigResult;
use crate::hash::ObjectId;

/// Message of the root commit every repository starts from.
pub const INITIAL_MESSAGE: &str = "initial commit";

/// A commit record.
///
/// Root, ordinary and merge commits share this one shape; they differ only
/// in how many parents are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// First parent (None only for the root commit).
    pub parent: Option<ObjectId>,
    /// Second parent (Some only for merge commits).
    pub second_parent: Option<ObjectId>,
    /// Snapshot of every tracked file.
    pub files: BTreeMap<String, ObjectId>,
}

impl Commit {
    /// The root commit: empty tree, Unix epoch timestamp.
    ///
    /// It is identical in every repository, so independently initialised
    /// repositories share a common ancestor.
    pub fn root() -> Self {
        Commit {
            message: INITIAL_MESSAGE.to_string(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            parent: None,
            second_parent: None,
            files: BTreeMap::new(),
        }
    }

    /// Build a child of `parent` (whose id is `parent_id`) stamped now.
    ///
    /// The snapshot is the parent's with `additions` overlaid and
    /// `removals` deleted.
    pub fn child<'a>(
        parent: &Commit,
        parent_id: ObjectId,
        second_parent: Option<ObjectId>,
        message: String,
        additions: &BTreeMap<String, ObjectId>,
        removals: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let mut files = parent.files.clone();
        for (name, blob) in additions {
            files.insert(name.clone(), blob.clone());
        }
        for name in removals {
            files.remove(name);
        }
        Commit {
            message,
            timestamp: Utc::now(),
            parent: Some(parent_id),
            second_parent,
            files,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.second_parent.is_some()
    }

    /// Both parent ids, first parent first.
    pub fn parents(&self) -> impl Iterator<Item = &ObjectId> {
        self.parent.iter().chain(self.second_parent.iter())
    }

    pub fn blob_for(&self, name: &str) -> Option<&ObjectId> {
        self.files.get(name)
    }

    pub fn tracks(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Canonical serialized form; its hash is the commit id.
    pub fn encode(&self) -> TwigResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> TwigResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// The id this commit gets once stored.
    pub fn id(&self) -> TwigResult<ObjectId> {
        Ok(ObjectId::of(&self.encode()?))
    }
}
