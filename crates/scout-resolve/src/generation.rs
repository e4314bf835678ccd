use std::sync::atomic::{AtomicU64, Ordering};

/// Counts completed workspace syncs.
///
/// Generation 0 means "no sync has completed yet". The counter advances
/// exactly once per completed sync, regardless of the sync's outcome, since
/// any completed refresh may have changed the graph. It never decreases.
///
/// Cached derived state (the reverse dependency index, per-module candidate
/// lists) is keyed by this counter and recomputed whenever it advances.
#[derive(Debug, Default)]
pub struct SyncGeneration {
    counter: AtomicU64,
}

impl SyncGeneration {
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn on_sync_completed(&self) {
        self.counter.fetch_add(1, Ordering::AcqRel);
    }
}
