//! Bidirectional index of dependency edges.
//!
//! Stores, for every artifact key, the descriptors that depend on it, along with
//! the reverse (descriptor → keys) view used to purge a descriptor's edges when its
//! facade is removed or replaced. Enables both:
//! - "Find Dependents": given an artifact key, find every descriptor depending on it
//! - "Find Dependencies": given a descriptor, find every key it has edges to

use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

use crate::base::{ArtifactKey, DescriptorId};

pub(crate) type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Partition an edge is recorded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Dependency resolved against another workspace module.
    Workspace,
    /// Dependency resolved outside the workspace.
    External,
    /// Artifact the resolver reported missing; kept so a later workspace change
    /// that supplies it triggers re-resolution.
    Missing,
}

/// Entry in the reverse index: all descriptors with an edge to one key.
#[derive(Debug, Clone, Default)]
struct DependentsEntry {
    workspace: FxIndexSet<DescriptorId>,
    external: FxIndexSet<DescriptorId>,
    missing: FxIndexSet<DescriptorId>,
}

impl DependentsEntry {
    fn partition(&self, kind: EdgeKind) -> &FxIndexSet<DescriptorId> {
        match kind {
            EdgeKind::Workspace => &self.workspace,
            EdgeKind::External => &self.external,
            EdgeKind::Missing => &self.missing,
        }
    }

    fn partition_mut(&mut self, kind: EdgeKind) -> &mut FxIndexSet<DescriptorId> {
        match kind {
            EdgeKind::Workspace => &mut self.workspace,
            EdgeKind::External => &mut self.external,
            EdgeKind::Missing => &mut self.missing,
        }
    }

    fn remove(&mut self, source: &DescriptorId) {
        self.workspace.shift_remove(source);
        self.external.shift_remove(source);
        self.missing.shift_remove(source);
    }

    fn is_empty(&self) -> bool {
        self.workspace.is_empty() && self.external.is_empty() && self.missing.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &DescriptorId> {
        self.workspace
            .iter()
            .chain(self.external.iter())
            .chain(self.missing.iter())
    }
}

/// Reverse dependency index keyed by artifact.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    /// Reverse index: artifact key → descriptors depending on it
    reverse: FxHashMap<ArtifactKey, DependentsEntry>,

    /// Forward index: descriptor → keys it has edges to (for cleanup)
    forward: FxHashMap<DescriptorId, FxIndexSet<(ArtifactKey, EdgeKind)>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge from `source` to `key`. Idempotent.
    pub fn add_edge(&mut self, source: &DescriptorId, key: &ArtifactKey, kind: EdgeKind) {
        trace!(source = %source, key = %key, ?kind, "add dependency edge");
        self.reverse
            .entry(key.clone())
            .or_default()
            .partition_mut(kind)
            .insert(source.clone());
        self.forward
            .entry(source.clone())
            .or_default()
            .insert((key.clone(), kind));
    }

    /// Remove every edge whose source is `source`.
    pub fn remove_source(&mut self, source: &DescriptorId) {
        let Some(edges) = self.forward.remove(source) else {
            return;
        };
        trace!(source = %source, count = edges.len(), "remove dependency edges");
        for (key, _) in edges {
            if let Some(entry) = self.reverse.get_mut(&key) {
                entry.remove(source);
                if entry.is_empty() {
                    self.reverse.remove(&key);
                }
            }
        }
    }

    /// Every descriptor with an edge of any kind to `key`.
    pub fn dependents(&self, key: &ArtifactKey) -> impl Iterator<Item = &DescriptorId> {
        self.reverse.get(key).into_iter().flat_map(|e| e.iter())
    }

    /// Descriptors with an edge of `kind` to `key`.
    pub fn dependents_of_kind(
        &self,
        key: &ArtifactKey,
        kind: EdgeKind,
    ) -> impl Iterator<Item = &DescriptorId> {
        self.reverse
            .get(key)
            .into_iter()
            .flat_map(move |e| e.partition(kind).iter())
    }

    /// Keys `source` has edges to, with their partition.
    pub fn edges_from(&self, source: &DescriptorId) -> impl Iterator<Item = &(ArtifactKey, EdgeKind)> {
        self.forward.get(source).into_iter().flat_map(|e| e.iter())
    }

    /// Every key with at least one dependent.
    pub fn keys(&self) -> impl Iterator<Item = &ArtifactKey> {
        self.reverse.keys()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn clear(&mut self) {
        self.reverse.clear();
        self.forward.clear();
    }
}
