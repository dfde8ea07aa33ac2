//! Process-wide registry instance shared between the refresh engine and readers.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::base::{ArtifactKey, DescriptorId};
use crate::project::ProjectFacade;

use super::dependency_index::FxIndexSet;
use super::state::WorkspaceState;

/// Shared [`WorkspaceState`] with a reader-writer discipline.
///
/// Readers take the read lock only long enough to clone an `Arc` out, so they
/// never wait on a resolver call. The engine holds the write lock only while
/// committing one descriptor's removal and replacement, which readers therefore
/// observe as a single step.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    state: RwLock<WorkspaceState>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_facade(&self, id: &DescriptorId) -> Option<Arc<ProjectFacade>> {
        self.state.read().get_facade(id).cloned()
    }

    /// Every tracked facade, in insertion order. A replaced facade moves to the end.
    pub fn facades(&self) -> Vec<Arc<ProjectFacade>> {
        self.state.read().facades().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().facade_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn facade_for_artifact(&self, key: &ArtifactKey) -> Option<Arc<ProjectFacade>> {
        self.state.read().facade_for_artifact(key).cloned()
    }

    /// Direct dependents of the facade currently tracked for `id`.
    pub fn dependents(&self, id: &DescriptorId, include_module_edges: bool) -> FxIndexSet<DescriptorId> {
        let state = self.state.read();
        match state.get_facade(id) {
            Some(facade) => state.get_dependents(id, facade, include_module_edges),
            None => FxIndexSet::default(),
        }
    }

    /// Run `f` against a consistent view of the whole graph.
    pub fn read<R>(&self, f: impl FnOnce(&WorkspaceState) -> R) -> R {
        f(&self.state.read())
    }

    /// Run `f` with exclusive access. Only the refresh engine mutates the graph.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut WorkspaceState) -> R) -> R {
        f(&mut self.state.write())
    }

    /// Drop all tracked state.
    pub fn clear(&self) {
        self.state.write().clear();
    }
}
