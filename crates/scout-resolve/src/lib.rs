//! Deploy-archive class resolution for Bazel-style workspaces.
//!
//! A library target's compiled output is not directly loadable at render
//! time. Instead, resolution finds a *binary* target that transitively
//! depends on the library and has already produced a deploy archive, then
//! searches that archive for the class:
//! - [`SyncGeneration`] counts completed syncs and invalidates everything
//!   downstream.
//! - [`ReverseBinaryDeps`] maps each resource target to the binaries that
//!   depend on it, recomputed once per generation via [`GenerationCache`].
//! - [`ArchiveClassResolver`] resolves class names for one resource module
//!   against its candidate binaries, rotating its starting candidate so
//!   repeated lookups spread across archives.

mod generation;
mod index;
mod resolver;

pub use generation::SyncGeneration;
pub use index::{GenerationCache, ReverseBinaryDeps};
pub use resolver::{
    ArchiveClassResolver, ClassDirFallback, FallbackClassResolver, NoRegistry, ProjectState,
    ResourceRegistry, SnapshotProvider, SnapshotSlot,
};
