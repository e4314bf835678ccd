use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use scout_archive::{class_entry_path, Archive, ClassLocation};
use scout_build_model::{DepOracle, WorkspaceSnapshot};
use scout_core::TargetKey;

use crate::{GenerationCache, ReverseBinaryDeps, SyncGeneration};

/// Source of the current workspace snapshot.
///
/// Returns `None` until the first sync completes; resolution then degrades to
/// the fallback resolver.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> Option<Arc<WorkspaceSnapshot>>;
}

/// A [`SnapshotProvider`] backed by a replaceable slot. Build integrations
/// install a fresh snapshot whenever a sync completes.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    slot: RwLock<Option<Arc<WorkspaceSnapshot>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, snapshot: WorkspaceSnapshot) {
        *self.slot.write() = Some(Arc::new(snapshot));
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}

impl SnapshotProvider for SnapshotSlot {
    fn snapshot(&self) -> Option<Arc<WorkspaceSnapshot>> {
        self.slot.read().clone()
    }
}

/// Secondary resolution strategy used when no candidate binary yields the
/// class: zero candidates, or a full scan missed everywhere.
pub trait FallbackClassResolver: Send + Sync {
    fn find_class(&self, fqcn: &str) -> Option<ClassLocation>;
}

/// Fallback that looks for the class in a module's ordinary compiled-output
/// directories.
#[derive(Debug, Clone, Default)]
pub struct ClassDirFallback {
    roots: Vec<PathBuf>,
}

impl ClassDirFallback {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }
}

impl FallbackClassResolver for ClassDirFallback {
    fn find_class(&self, fqcn: &str) -> Option<ClassLocation> {
        let entry = class_entry_path(fqcn);
        self.roots
            .iter()
            .find(|root| root.join(&entry).is_file())
            .map(|root| ClassLocation::new(root.clone(), entry.clone()))
    }
}

/// Records which binary's resource package a resolved class belongs to, so
/// later unrelated lookups attribute resource ownership correctly.
/// Registration is fire-and-forget and happens only for classes found via a
/// candidate deploy archive, never for fallback hits.
pub trait ResourceRegistry: Send + Sync {
    fn register_class(&self, owner: &TargetKey, class: &ClassLocation, fqcn: &str);
}

/// Registry for callers that do not track resource ownership.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegistry;

impl ResourceRegistry for NoRegistry {
    fn register_class(&self, _owner: &TargetKey, _class: &ClassLocation, _fqcn: &str) {}
}

/// Per-workspace shared state: the sync generation counter, the snapshot
/// source, the dependency oracle, and the memoized reverse dependency index.
pub struct ProjectState {
    generation: SyncGeneration,
    provider: Arc<dyn SnapshotProvider>,
    oracle: Arc<dyn DepOracle>,
    index: GenerationCache<ReverseBinaryDeps>,
}

impl ProjectState {
    pub fn new(provider: Arc<dyn SnapshotProvider>, oracle: Arc<dyn DepOracle>) -> Self {
        Self {
            generation: SyncGeneration::new(),
            provider,
            oracle,
            index: GenerationCache::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// Notifies the generation counter that a sync completed. The next
    /// resolution on any module recomputes its candidates.
    pub fn on_sync_completed(&self) {
        self.generation.on_sync_completed();
    }

    pub fn snapshot(&self) -> Option<Arc<WorkspaceSnapshot>> {
        self.provider.snapshot()
    }

    /// Reverse dependency index for the current generation, or an empty index
    /// when no snapshot is available.
    pub fn reverse_deps(&self) -> Arc<ReverseBinaryDeps> {
        let generation = self.generation();
        match self.snapshot() {
            Some(snapshot) => self.reverse_deps_at(generation, &snapshot),
            None => Arc::new(ReverseBinaryDeps::default()),
        }
    }

    fn reverse_deps_at(
        &self,
        generation: u64,
        snapshot: &WorkspaceSnapshot,
    ) -> Arc<ReverseBinaryDeps> {
        self.index.get_or_compute(generation, || {
            ReverseBinaryDeps::compute(snapshot, self.oracle.as_ref())
        })
    }
}

#[derive(Debug, Default)]
struct ResolverState {
    /// Candidate binaries in index order, deduplicated keeping first
    /// occurrence. Recomputed whenever `cached_generation` goes stale.
    candidates: Vec<TargetKey>,
    /// Starting offset for the next circular scan. Always within
    /// `[0, candidates.len())` when candidates exist. Only written back on a
    /// hit: a fully missed scan made no progress worth remembering.
    cursor: usize,
    cached_generation: Option<u64>,
}

/// Resolves fully-qualified class names for one resource module against the
/// deploy archives of the binaries that depend on the module's resource
/// targets.
pub struct ArchiveClassResolver {
    module: String,
    project: Arc<ProjectState>,
    fallback: Arc<dyn FallbackClassResolver>,
    registry: Arc<dyn ResourceRegistry>,
    state: Mutex<ResolverState>,
}

impl ArchiveClassResolver {
    pub fn new(
        module: impl Into<String>,
        project: Arc<ProjectState>,
        fallback: Arc<dyn FallbackClassResolver>,
        registry: Arc<dyn ResourceRegistry>,
    ) -> Self {
        Self {
            module: module.into(),
            project,
            fallback,
            registry,
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Resolve `fqcn` to a class file inside a candidate binary's deploy
    /// archive, falling back to the secondary strategy when no candidate
    /// yields it. Absent archives, unreadable archives, and plain misses are
    /// all non-fatal: they only affect which candidate is tried next.
    pub fn find_class(&self, fqcn: &str) -> Option<ClassLocation> {
        let mut state = self.state.lock();

        // Snapshot the generation before reading graph data. If a sync lands
        // between the two reads we may compute against the newer snapshot
        // under the older generation number; the next lookup heals it.
        let generation = self.project.generation();
        let Some(snapshot) = self.project.snapshot() else {
            return self.fallback.find_class(fqcn);
        };

        self.refresh_candidates(&mut state, generation, &snapshot);

        if state.candidates.is_empty() {
            tracing::warn!(
                target: "scout.resolve",
                module = %self.module,
                fqcn,
                "no candidate binaries for module"
            );
            return self.fallback.find_class(fqcn);
        }

        // Circular scan starting at the rotation cursor. Candidates that
        // missed before are probed again: their archives may have been
        // rebuilt with the class since.
        let len = state.candidates.len();
        for step in 0..len {
            let idx = (state.cursor + step) % len;
            let candidate = &state.candidates[idx];
            if let Some(class) = probe_candidate(&snapshot, candidate, fqcn) {
                // Start the next lookup one candidate further around, so a
                // hit here does not make every subsequent lookup re-probe
                // this binary first.
                self.registry.register_class(candidate, &class, fqcn);
                state.cursor = (idx + 1) % len;
                return Some(class);
            }
        }

        let labels: Vec<&str> = state
            .candidates
            .iter()
            .map(|key| key.label().as_str())
            .collect();
        tracing::warn!(
            target: "scout.resolve",
            module = %self.module,
            fqcn,
            candidates = len,
            candidate_labels = ?labels,
            "class not found in any candidate deploy archive"
        );
        self.fallback.find_class(fqcn)
    }

    /// Recomputes the candidate list when the cached generation is stale.
    /// Staleness is binary: any mismatch rebuilds the whole list and resets
    /// the cursor, since candidate ordering may not survive a resync.
    fn refresh_candidates(
        &self,
        state: &mut ResolverState,
        generation: u64,
        snapshot: &WorkspaceSnapshot,
    ) {
        if state.cached_generation == Some(generation) {
            return;
        }

        let index = self.project.reverse_deps_at(generation, snapshot);
        let mut candidates = Vec::new();
        if let Some(module) = snapshot.resource_module(&self.module) {
            for source in &module.source_targets {
                for binary in index.dependents(source) {
                    if !candidates.contains(binary) {
                        candidates.push(binary.clone());
                    }
                }
            }
        }

        state.candidates = candidates;
        state.cursor = 0;
        state.cached_generation = Some(generation);
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.state.lock().cursor
    }
}

/// Looks for `fqcn` in one candidate binary's deploy archive. Any failure is
/// a miss for that candidate only.
fn probe_candidate(
    snapshot: &WorkspaceSnapshot,
    candidate: &TargetKey,
    fqcn: &str,
) -> Option<ClassLocation> {
    let target = snapshot.target(candidate)?;
    let archive_path = target.deploy_archive.as_ref()?;

    let entry = class_entry_path(fqcn);
    match Archive::new(archive_path).contains(&entry) {
        Ok(true) => Some(ClassLocation::new(archive_path.clone(), entry)),
        Ok(false) => None,
        Err(err) => {
            tracing::debug!(
                target: "scout.resolve",
                label = %candidate.label(),
                error = %err,
                "failed to read deploy archive; treating as miss"
            );
            None
        }
    }
}
