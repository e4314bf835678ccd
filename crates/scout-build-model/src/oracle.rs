//! Dependency-graph reachability queries.

use std::collections::HashSet;

use scout_core::TargetKey;

use crate::WorkspaceSnapshot;

/// Answers "which of these candidates are reachable from this target" over
/// the dependency graph of one snapshot.
///
/// The query is bounded to a candidate set because the full transitive
/// closure of a binary can be enormous; callers only ever care about a small,
/// known set of targets. Implementations may be expensive and are queried at
/// most once per binary per sync generation.
pub trait DepOracle: Send + Sync {
    /// Members of `candidates` reachable from `source` by following
    /// dependency edges. `source` itself is not considered reachable unless a
    /// dependency cycle leads back to it.
    fn reachable_subset(
        &self,
        snapshot: &WorkspaceSnapshot,
        source: &TargetKey,
        candidates: &HashSet<TargetKey>,
    ) -> HashSet<TargetKey>;
}

/// Breadth-first reachability over the snapshot's direct dependency edges.
///
/// Stops early once every candidate has been found. Edges pointing at targets
/// missing from the snapshot are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitiveClosureOracle;

impl DepOracle for TransitiveClosureOracle {
    fn reachable_subset(
        &self,
        snapshot: &WorkspaceSnapshot,
        source: &TargetKey,
        candidates: &HashSet<TargetKey>,
    ) -> HashSet<TargetKey> {
        let mut found = HashSet::new();
        if candidates.is_empty() {
            return found;
        }

        let mut visited = HashSet::new();
        let mut queue: Vec<&TargetKey> = match snapshot.target(source) {
            Some(info) => info.deps.iter().collect(),
            None => return found,
        };

        while let Some(key) = queue.pop() {
            if !visited.insert(key.clone()) {
                continue;
            }
            if candidates.contains(key) {
                found.insert(key.clone());
                if found.len() == candidates.len() {
                    break;
                }
            }
            if let Some(info) = snapshot.target(key) {
                queue.extend(info.deps.iter());
            }
        }

        found
    }
}
