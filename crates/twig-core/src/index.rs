//! Staging index.
//!
//! Records what the next commit will change relative to the active tip:
//! files staged for addition (name → blob id) and files staged for removal.
//! A name is never in both parts at once. Stored as `.twig/index.json`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TwigResult;
use crate::fsutil::atomic_write;
use crate::hash::ObjectId;

/// Pending additions and removals.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    #[serde(default)]
    pub additions: BTreeMap<String, ObjectId>,
    #[serde(default)]
    pub removals: BTreeSet<String>,
}

/// What `flush_and_clear` hands to commit creation.
#[derive(Debug, Default, Clone)]
pub struct Staged {
    pub additions: BTreeMap<String, ObjectId>,
    pub removals: BTreeSet<String>,
}

impl Index {
    /// Load the index from a JSON file, or return an empty index.
    pub fn load(path: &Path) -> TwigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the index to a JSON file (atomic: temp + fsync + rename).
    pub fn save(&self, path: &Path) -> TwigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Stage `blob` as the new content of `name`.
    ///
    /// `committed` is the blob the active tip records for `name`. When the
    /// two match there is nothing to commit, so any addition entry is
    /// dropped instead. Either way a pending removal is cancelled.
    pub fn stage_add(&mut self, name: &str, blob: ObjectId, committed: Option<&ObjectId>) {
        self.removals.remove(name);
        if committed == Some(&blob) {
            self.additions.remove(name);
        } else {
            self.additions.insert(name.to_string(), blob);
        }
    }

    /// Unstage any addition of `name`; when `tracked`, record a removal.
    ///
    /// Returns false when there was nothing to do (the caller reports
    /// `NothingToRemove`).
    pub fn stage_remove(&mut self, name: &str, tracked: bool) -> bool {
        let was_staged = self.additions.remove(name).is_some();
        if tracked {
            self.removals.insert(name.to_string());
        }
        was_staged || tracked
    }

    pub fn is_staged_for_addition(&self, name: &str) -> bool {
        self.additions.contains_key(name)
    }

    pub fn is_staged_for_removal(&self, name: &str) -> bool {
        self.removals.contains(name)
    }

    /// Hand over every pending change and leave the index empty.
    pub fn flush_and_clear(&mut self) -> Staged {
        Staged {
            additions: std::mem::take(&mut self.additions),
            removals: std::mem::take(&mut self.removals),
        }
    }
}
