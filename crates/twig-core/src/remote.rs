//! Remotes — configuration and transfer types for push/fetch/pull.
//!
//! A remote is another store reachable by a filesystem path: either
//! another repository or a bare directory. Nothing goes over a network.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TwigResult;
use crate::fsutil::atomic_write;
use crate::graph;
use crate::hash::ObjectId;
use crate::merge::MergeReport;
use crate::store::Store;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Remote configuration stored at `.twig/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Named remotes (e.g. "origin" -> path).
    #[serde(default)]
    pub remotes: BTreeMap<String, RemoteEntry>,
}

/// A single remote entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Path to the remote store or to the repository that holds it.
    pub path: String,
}

impl RemoteConfig {
    pub fn load(path: &Path) -> TwigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> TwigResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        atomic_write(path, data.as_bytes())
    }
}

/// Name of the local branch that mirrors `branch` on `remote`.
pub fn tracking_branch(remote: &str, branch: &str) -> String {
    format!("{remote}-{branch}")
}

// ---------------------------------------------------------------------------
// Object transfer
// ---------------------------------------------------------------------------

/// Objects copied by [`transfer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    pub commits: usize,
    pub blobs: usize,
}

/// Copy every commit reachable from `tip` in `src`, and every blob those
/// commits reference, that `dst` does not have yet.
///
/// Blobs go first and commits oldest-first, so `dst` never holds a commit
/// whose parents or files are missing.
pub fn transfer(src: &Store, dst: &Store, tip: &ObjectId) -> TwigResult<TransferStats> {
    let closure = graph::reachable(src, tip)?;
    let mut stats = TransferStats::default();

    for blob in &closure.blobs {
        if !dst.blobs.contains(blob) {
            dst.blobs.put(&src.blobs.get(blob)?)?;
            stats.blobs += 1;
        }
    }
    for commit in &closure.commits {
        if !dst.commits.contains(commit) {
            dst.commits.put(&src.commits.get(commit)?)?;
            debug!(commit = %commit.short(), "copied commit");
            stats.commits += 1;
        }
    }
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Operation results
// ---------------------------------------------------------------------------

/// Result of a push.
#[derive(Debug, Clone, Serialize)]
pub struct PushResult {
    pub remote: String,
    pub branch: String,
    pub tip: ObjectId,
    pub copied: TransferStats,
    /// False when the remote branch already pointed at `tip`.
    pub branch_updated: bool,
}

/// Result of a fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub remote: String,
    pub branch: String,
    pub tracking_branch: String,
    pub tip: ObjectId,
    pub copied: TransferStats,
}

/// Result of a pull: the fetch, then the merge of the tracking branch.
#[derive(Debug, Clone, Serialize)]
pub struct PullResult {
    pub fetch: FetchResult,
    pub merge: MergeReport,
}
