//! Commit graph queries.
//!
//! Commits reference their parents by id, so the history is an arena keyed
//! by id rather than a linked structure. Traversals use explicit worklists
//! and work against any [`CommitSource`], which lets the same code walk
//! the local store and a remote one.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::commit::Commit;
use crate::error::TwigResult;
use crate::hash::ObjectId;

/// Anything commits can be loaded from.
pub trait CommitSource {
    fn commit(&self, id: &ObjectId) -> TwigResult<Commit>;
}

/// Every ancestor of `start` with its shortest edge distance.
///
/// Follows both parent links breadth-first, so the first time a commit is
/// reached is along a shortest path. `start` itself is not included.
pub fn ancestors_of(
    source: &impl CommitSource,
    start: &ObjectId,
) -> TwigResult<HashMap<ObjectId, usize>> {
    let mut distances = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back((start.clone(), 0usize));

    while let Some((id, distance)) = queue.pop_front() {
        let commit = source.commit(&id)?;
        for parent in commit.parents() {
            if parent == start || distances.contains_key(parent) {
                continue;
            }
            distances.insert(parent.clone(), distance + 1);
            queue.push_back((parent.clone(), distance + 1));
        }
    }
    Ok(distances)
}

/// True if `ancestor` is `descendant` or one of its ancestors.
pub fn is_ancestor(
    source: &impl CommitSource,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> TwigResult<bool> {
    if ancestor == descendant {
        return Ok(true);
    }
    Ok(ancestors_of(source, descendant)?.contains_key(ancestor))
}

/// The common ancestor a three-way merge of `current` and `given` uses.
///
/// Each tip counts as its own ancestor at distance 0. Among the common
/// ancestors, the one closest to `current` wins; remaining ties go to the
/// one closest to `given`, then to the smaller id. This shortest-distance
/// rule is not a true lowest-common-ancestor search on every DAG shape.
/// Returns `None` when the histories share nothing.
pub fn split_point(
    source: &impl CommitSource,
    current: &ObjectId,
    given: &ObjectId,
) -> TwigResult<Option<ObjectId>> {
    let mut from_current = ancestors_of(source, current)?;
    from_current.insert(current.clone(), 0);
    let mut from_given = ancestors_of(source, given)?;
    from_given.insert(given.clone(), 0);

    let best = from_current
        .iter()
        .filter_map(|(id, &dc)| from_given.get(id).map(|&dg| (dc, dg, id)))
        .min();
    Ok(best.map(|(_, _, id)| id.clone()))
}

/// `start` and its first-parent chain back to the root, newest first.
pub fn first_parent_history(
    source: &impl CommitSource,
    start: &ObjectId,
) -> TwigResult<Vec<(ObjectId, Commit)>> {
    let mut history = Vec::new();
    let mut next = Some(start.clone());
    while let Some(id) = next {
        let commit = source.commit(&id)?;
        next = commit.parent.clone();
        history.push((id, commit));
    }
    Ok(history)
}

/// Commits and blobs reachable from `tip`.
#[derive(Debug, Default)]
pub struct Reachable {
    /// Every commit after all of its parents; `tip` last.
    pub commits: Vec<ObjectId>,
    pub blobs: BTreeSet<ObjectId>,
}

/// Collect the transitive closure of `tip` for copying to another store.
///
/// Commits come out in post-order of a depth-first walk over parent links,
/// which places each commit after both of its parents.
pub fn reachable(source: &impl CommitSource, tip: &ObjectId) -> TwigResult<Reachable> {
    let mut out = Reachable::default();
    let mut visited = HashSet::new();
    let mut stack = vec![(tip.clone(), false)];

    while let Some((id, parents_done)) = stack.pop() {
        if parents_done {
            out.commits.push(id);
            continue;
        }
        if !visited.insert(id.clone()) {
            continue;
        }
        let commit = source.commit(&id)?;
        out.blobs.extend(commit.files.values().cloned());
        stack.push((id, true));
        for parent in commit.parents() {
            if !visited.contains(parent) {
                stack.push((parent.clone(), false));
            }
        }
    }
    Ok(out)
}
