//! Build-graph model types shared across Scout build system integrations.
//!
//! A [`WorkspaceSnapshot`] is one sync's immutable view of the target graph:
//! per-target metadata plus the resource modules assembled from it. Snapshots
//! are replaced wholesale when a sync completes, never mutated in place.

mod oracle;

pub use oracle::{DepOracle, TransitiveClosureOracle};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use scout_core::TargetKey;

/// Classification of a target's build rule, as reported by the build system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Produces a self-contained, loadable deploy archive.
    Binary,
    Library,
    Test,
}

/// Per-target metadata extracted from build system output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub key: TargetKey,
    pub kind: RuleKind,
    /// Direct dependency edges, as declared in the build rule.
    pub deps: Vec<TargetKey>,
    /// Location of the deploy archive, if this target produces one and it has
    /// been built. `None` for libraries and for binaries that have never been
    /// built.
    pub deploy_archive: Option<PathBuf>,
}

impl TargetInfo {
    pub fn new(key: impl Into<TargetKey>, kind: RuleKind) -> Self {
        Self {
            key: key.into(),
            kind,
            deps: Vec::new(),
            deploy_archive: None,
        }
    }

    #[must_use]
    pub fn with_deps(mut self, deps: impl IntoIterator<Item = TargetKey>) -> Self {
        self.deps = deps.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_deploy_archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.deploy_archive = Some(path.into());
        self
    }
}

/// A named scope whose resources must be findable inside some binary's deploy
/// archive. Owns a fixed set of source target keys for the lifetime of one
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModule {
    pub name: String,
    pub source_targets: Vec<TargetKey>,
}

impl ResourceModule {
    pub fn new(
        name: impl Into<String>,
        source_targets: impl IntoIterator<Item = TargetKey>,
    ) -> Self {
        Self {
            name: name.into(),
            source_targets: source_targets.into_iter().collect(),
        }
    }
}

/// One generation's immutable view of the workspace target graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    targets: HashMap<TargetKey, TargetInfo>,
    resource_modules: Vec<ResourceModule>,
}

impl WorkspaceSnapshot {
    pub fn new(
        targets: impl IntoIterator<Item = TargetInfo>,
        resource_modules: impl IntoIterator<Item = ResourceModule>,
    ) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|info| (info.key.clone(), info))
                .collect(),
            resource_modules: resource_modules.into_iter().collect(),
        }
    }

    pub fn target(&self, key: &TargetKey) -> Option<&TargetInfo> {
        self.targets.get(key)
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetInfo> {
        self.targets.values()
    }

    /// Binary-kind targets in sorted-label order, so downstream candidate
    /// lists are reproducible across runs of the same snapshot.
    pub fn binary_targets(&self) -> Vec<&TargetInfo> {
        let mut binaries: Vec<&TargetInfo> = self
            .targets
            .values()
            .filter(|info| info.kind == RuleKind::Binary)
            .collect();
        binaries.sort_by(|a, b| a.key.label().cmp(b.key.label()));
        binaries
    }

    pub fn resource_modules(&self) -> &[ResourceModule] {
        &self.resource_modules
    }

    pub fn resource_module(&self, name: &str) -> Option<&ResourceModule> {
        self.resource_modules.iter().find(|m| m.name == name)
    }

    /// Union of every resource module's source target keys.
    pub fn resource_target_set(&self) -> HashSet<TargetKey> {
        self.resource_modules
            .iter()
            .flat_map(|module| module.source_targets.iter().cloned())
            .collect()
    }
}
