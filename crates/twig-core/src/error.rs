//! Error types for twig operations.

use std::fmt;
use std::io;

/// All possible twig errors.
///
/// Every variant is a user-facing failure: the operation that produced it
/// has been aborted and left the repository as it found it.
#[derive(Debug)]
pub enum TwigError {
    /// The directory is not a twig repository.
    NotARepo,
    /// A twig repository already exists here.
    AlreadyExists,
    /// An I/O error occurred.
    Io(io::Error),
    /// JSON serialization/deserialization failed.
    Json(serde_json::Error),
    /// An object with the given id is not in the store.
    NotFound(String),
    /// The file to stage does not exist in the working tree.
    FileNotFound(String),
    /// The file is neither staged nor tracked.
    NothingToRemove(String),
    /// Nothing is staged.
    EmptyCommit,
    /// The commit message is blank.
    EmptyMessage,
    /// No branch with this name.
    UnknownBranch(String),
    /// A branch with this name already exists.
    BranchExists(String),
    /// The active branch cannot be deleted.
    ActiveBranchDeletion(String),
    /// Checking out the branch that is already active.
    AlreadyOnBranch(String),
    /// No commit matches this id or prefix.
    UnknownCommit(String),
    /// More than one commit matches this prefix.
    AmbiguousCommitId(String, usize),
    /// The commit does not track this file.
    FileNotInCommit(String),
    /// No commit carries this message.
    NoCommitWithMessage(String),
    /// The staging index is not empty.
    UncommittedChanges,
    /// Merging the active branch into itself.
    SelfMerge(String),
    /// An untracked working file would be overwritten.
    UntrackedObstruction(String),
    /// A remote with this name is already configured.
    RemoteExists(String),
    /// No remote with this name is configured.
    UnknownRemote(String),
    /// The remote's directory cannot be reached.
    RemoteUnreachable(String),
    /// The remote has no such branch.
    UnknownRemoteBranch { remote: String, branch: String },
    /// The remote branch has commits the local history lacks.
    RemoteDivergence { remote: String, branch: String },
    /// A file name escapes the working tree.
    PathTraversal(String),
    /// The name cannot be stored as a single file under `branches/`.
    InvalidBranchName(String),
    /// Fetching would move the checked-out branch under the working tree.
    FetchIntoActiveBranch(String),
}

impl fmt::Display for TwigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwigError::NotARepo => write!(f, "not a twig repository (missing .twig/)"),
            TwigError::AlreadyExists => write!(f, ".twig/ already exists"),
            TwigError::Io(e) => write!(f, "I/O error: {e}"),
            TwigError::Json(e) => write!(f, "JSON error: {e}"),
            TwigError::NotFound(id) => write!(f, "object not found: {id}"),
            TwigError::FileNotFound(name) => write!(f, "file does not exist: {name}"),
            TwigError::NothingToRemove(name) => write!(f, "no reason to remove the file: {name}"),
            TwigError::EmptyCommit => write!(f, "no changes added to the commit"),
            TwigError::EmptyMessage => write!(f, "please enter a commit message"),
            TwigError::UnknownBranch(name) => {
                write!(f, "a branch with that name does not exist: {name}")
            }
            TwigError::BranchExists(name) => {
                write!(f, "a branch with that name already exists: {name}")
            }
            TwigError::ActiveBranchDeletion(name) => {
                write!(f, "cannot remove the current branch: {name}")
            }
            TwigError::AlreadyOnBranch(name) => {
                write!(f, "no need to checkout the current branch: {name}")
            }
            TwigError::UnknownCommit(id) => write!(f, "no commit with that id exists: {id}"),
            TwigError::AmbiguousCommitId(id, n) => {
                write!(f, "ambiguous commit id '{id}' matches {n} commits")
            }
            TwigError::FileNotInCommit(name) => {
                write!(f, "file does not exist in that commit: {name}")
            }
            TwigError::NoCommitWithMessage(msg) => {
                write!(f, "found no commit with that message: {msg}")
            }
            TwigError::UncommittedChanges => write!(f, "you have uncommitted changes"),
            TwigError::SelfMerge(name) => write!(f, "cannot merge a branch with itself: {name}"),
            TwigError::UntrackedObstruction(name) => write!(
                f,
                "there is an untracked file in the way ({name}); delete it, or add and commit it first"
            ),
            TwigError::RemoteExists(name) => {
                write!(f, "a remote with that name already exists: {name}")
            }
            TwigError::UnknownRemote(name) => {
                write!(f, "a remote with that name does not exist: {name}")
            }
            TwigError::RemoteUnreachable(path) => write!(f, "remote directory not found: {path}"),
            TwigError::UnknownRemoteBranch { remote, branch } => {
                write!(f, "remote '{remote}' does not have branch '{branch}'")
            }
            TwigError::RemoteDivergence { remote, branch } => write!(
                f,
                "'{remote}/{branch}' has commits missing locally; please fetch before pushing"
            ),
            TwigError::PathTraversal(path) => {
                write!(f, "path escapes the working tree: {path}")
            }
            TwigError::InvalidBranchName(name) => write!(f, "invalid branch name: {name:?}"),
            TwigError::FetchIntoActiveBranch(name) => write!(
                f,
                "cannot fetch into the current branch {name}; check out another branch first"
            ),
        }
    }
}

impl std::error::Error for TwigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TwigError::Io(e) => Some(e),
            TwigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TwigError {
    fn from(e: io::Error) -> Self {
        TwigError::Io(e)
    }
}

impl From<serde_json::Error> for TwigError {
    fn from(e: serde_json::Error) -> Self {
        TwigError::Json(e)
    }
}

/// Convenience alias for Results in twig.
pub type TwigResult<T> = Result<T, TwigError>;
