use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use scout_build_model::{DepOracle, WorkspaceSnapshot};
use scout_core::TargetKey;

/// Maps each resource target to the binary targets that transitively depend
/// on it. A binary that is itself a resource target maps to itself, since its
/// own deploy archive is the correct artifact for its own resources.
///
/// Built once per sync generation from an immutable snapshot and never
/// updated incrementally: any graph change invalidates the whole index, which
/// trades recomputation cost for the absence of partial-invalidation bugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseBinaryDeps {
    dependents: HashMap<TargetKey, Vec<TargetKey>>,
}

impl ReverseBinaryDeps {
    /// Compute the index for one snapshot.
    ///
    /// Queries the oracle once per binary, bounded to the union of all
    /// resource modules' source targets. This is the expensive step of a
    /// generation and is expected to run behind [`GenerationCache`].
    pub fn compute(snapshot: &WorkspaceSnapshot, oracle: &dyn DepOracle) -> Self {
        let resource_targets = snapshot.resource_target_set();
        if resource_targets.is_empty() {
            return Self::default();
        }

        let mut dependents: HashMap<TargetKey, Vec<TargetKey>> = HashMap::new();
        for binary in snapshot.binary_targets() {
            if resource_targets.contains(&binary.key) {
                push_unique(dependents.entry(binary.key.clone()).or_default(), &binary.key);
            }

            for resource in oracle.reachable_subset(snapshot, &binary.key, &resource_targets) {
                push_unique(dependents.entry(resource).or_default(), &binary.key);
            }
        }

        Self { dependents }
    }

    /// Binaries depending on `key`, in the deterministic order produced by
    /// the computation (sorted-label binary enumeration, first occurrence
    /// kept).
    pub fn dependents(&self, key: &TargetKey) -> &[TargetKey] {
        self.dependents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }
}

fn push_unique(binaries: &mut Vec<TargetKey>, key: &TargetKey) {
    if !binaries.iter().any(|existing| existing == key) {
        binaries.push(key.clone());
    }
}

/// Memoizes one value per sync generation with at-most-once compute
/// semantics.
///
/// Only the current generation is ever queried, so a single slot suffices.
/// The lock is held across the compute: when many consumers go stale at once
/// after a sync, the first one computes and the rest wait for its result
/// instead of racing redundant graph walks.
#[derive(Debug, Default)]
pub struct GenerationCache<T> {
    slot: Mutex<Option<(u64, Arc<T>)>>,
}

impl<T> GenerationCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_compute(&self, generation: u64, compute: impl FnOnce() -> T) -> Arc<T> {
        let mut slot = self.slot.lock();
        if let Some((cached, value)) = slot.as_ref() {
            if *cached == generation {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(compute());
        *slot = Some((generation, Arc::clone(&value)));
        value
    }
}
