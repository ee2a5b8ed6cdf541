//! twig-core — Core library for a small content-addressed version control system.
//!
//! Twig snapshots a flat working tree into **commits** stored by SHA-256,
//! keeps named **branches** over a commit DAG, merges branches with a
//! three-way rule around a **split point**, and copies history between
//! repositories reachable on the local filesystem.

pub mod commit;
pub mod error;
pub mod fsutil;
pub mod graph;
pub mod hash;
pub mod index;
pub mod merge;
pub mod object;
pub mod refs;
pub mod remote;
pub mod repo;
pub mod state;
pub mod store;
pub mod worktree;

pub use error::{TwigError, TwigResult};
pub use hash::ObjectId;
pub use repo::Repository;
