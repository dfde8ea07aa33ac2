//! Workspace state: the graph of tracked facades.
//!
//! Pure, synchronous data structure. No I/O and no locking; the shared
//! [`ProjectRegistry`](super::ProjectRegistry) wraps it for concurrent access.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::base::{ArtifactKey, DescriptorId};
use crate::project::ProjectFacade;
use super::dependency_index::{DependencyIndex, EdgeKind, FxIndexSet};
use super::error::ModuleCycle;

/// Facades keyed by descriptor identity, with their dependency and module indices.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceState {
    /// Forward map, in insertion order for deterministic listing.
    facades: IndexMap<DescriptorId, Arc<ProjectFacade>, FxBuildHasher>,
    /// Published artifact → descriptor publishing it.
    artifacts: FxHashMap<ArtifactKey, DescriptorId>,
    dependencies: DependencyIndex,
    /// Parent → nested children, for facades with module inclusion enabled.
    modules: FxHashMap<DescriptorId, FxIndexSet<DescriptorId>>,
    /// Parent → every workspace path implied by its declared modules.
    workspace_modules: FxHashMap<DescriptorId, FxIndexSet<DescriptorId>>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Facades
    // ------------------------------------------------------------------------

    pub fn get_facade(&self, id: &DescriptorId) -> Option<&Arc<ProjectFacade>> {
        self.facades.get(id)
    }

    pub fn facades(&self) -> impl Iterator<Item = &Arc<ProjectFacade>> {
        self.facades.values()
    }

    pub fn facade_count(&self) -> usize {
        self.facades.len()
    }

    /// Facade publishing `key`, if one is tracked.
    pub fn facade_for_artifact(&self, key: &ArtifactKey) -> Option<&Arc<ProjectFacade>> {
        self.artifacts.get(key).and_then(|id| self.facades.get(id))
    }

    /// Install `facade` and index its dependencies and nested modules.
    ///
    /// Any prior facade for the same identity must already have been removed with
    /// [`remove_facade`](Self::remove_facade).
    pub fn add_facade(&mut self, facade: Arc<ProjectFacade>) {
        let id = facade.id().clone();
        if self.facades.contains_key(&id) {
            warn!(descriptor = %id, "facade added over an existing one; purging old edges");
            self.remove_facade(&id);
        }

        let kind = if facade.configuration().resolve_workspace_projects {
            EdgeKind::Workspace
        } else {
            EdgeKind::External
        };
        for key in facade.dependency_keys() {
            self.dependencies.add_edge(&id, key, kind);
        }

        if facade.configuration().include_modules {
            let children: FxIndexSet<DescriptorId> = facade.nested_modules().collect();
            if !children.is_empty() {
                self.modules.insert(id.clone(), children);
            }
        }

        self.artifacts
            .insert(facade.artifact_key().clone(), id.clone());
        self.facades.insert(id, facade);
    }

    /// Delete the facade for `id` and every dependency and module-index entry
    /// sourced from it. Edges are purged even when no facade is tracked, which
    /// clears unsatisfied edges left by a failed resolution.
    pub fn remove_facade(&mut self, id: &DescriptorId) -> Option<Arc<ProjectFacade>> {
        self.dependencies.remove_source(id);
        self.modules.remove(id);
        let facade = self.facades.shift_remove(id)?;
        if self.artifacts.get(facade.artifact_key()) == Some(id) {
            self.artifacts.remove(facade.artifact_key());
        }
        trace!(descriptor = %id, "facade removed");
        Some(facade)
    }

    // ------------------------------------------------------------------------
    // Dependency edges
    // ------------------------------------------------------------------------

    pub fn add_dependency_edge(&mut self, id: &DescriptorId, key: &ArtifactKey, kind: EdgeKind) {
        self.dependencies.add_edge(id, key, kind);
    }

    pub fn dependency_index(&self) -> &DependencyIndex {
        &self.dependencies
    }

    /// Descriptors directly depending on `facade`'s artifact or parent artifact,
    /// plus its tracked nested modules when `include_module_edges` is set.
    ///
    /// One hop only; the engine re-enqueues to propagate further.
    pub fn get_dependents(
        &self,
        id: &DescriptorId,
        facade: &ProjectFacade,
        include_module_edges: bool,
    ) -> FxIndexSet<DescriptorId> {
        let mut dependents = FxIndexSet::default();
        let keys = std::iter::once(facade.artifact_key()).chain(facade.parent_key());
        for key in keys {
            dependents.extend(self.dependencies.dependents(key).cloned());
        }
        if include_module_edges {
            if let Some(children) = self.modules.get(id) {
                dependents.extend(children.iter().cloned());
            }
        }
        dependents.shift_remove(id);
        dependents
    }

    // ------------------------------------------------------------------------
    // Module indices
    // ------------------------------------------------------------------------

    /// Nested children recorded for `id` in the module index.
    pub fn nested_modules(&self, id: &DescriptorId) -> impl Iterator<Item = &DescriptorId> {
        self.modules.get(id).into_iter().flat_map(|c| c.iter())
    }

    /// Record the workspace paths implied by `module_names` for `id`.
    /// Returns the paths that were not recorded before.
    pub fn add_workspace_module_edges<'a>(
        &mut self,
        id: &DescriptorId,
        module_names: impl IntoIterator<Item = &'a str>,
    ) -> FxIndexSet<DescriptorId> {
        let recorded = self.workspace_modules.entry(id.clone()).or_default();
        let mut added = FxIndexSet::default();
        for path in module_names.into_iter().filter_map(|name| id.module(name)) {
            if recorded.insert(path.clone()) {
                added.insert(path);
            }
        }
        if recorded.is_empty() {
            self.workspace_modules.remove(id);
        }
        added
    }

    /// Forget the workspace paths recorded for `id`, returning them.
    pub fn remove_workspace_module_edges(&mut self, id: &DescriptorId) -> FxIndexSet<DescriptorId> {
        self.workspace_modules.remove(id).unwrap_or_default()
    }

    pub fn workspace_module_paths(&self, id: &DescriptorId) -> impl Iterator<Item = &DescriptorId> {
        self.workspace_modules.get(id).into_iter().flat_map(|c| c.iter())
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Visit the facade for `root`, then its nested modules depth-first through the
    /// module index. `visit` returns `ControlFlow::Break` to stop early.
    ///
    /// Untracked children are skipped and a module reachable twice is visited once.
    /// A module that is its own ancestor stops the walk with [`ModuleCycle`];
    /// facades visited before that point stay visited.
    pub fn visit_nested<F>(&self, root: &DescriptorId, mut visit: F) -> Result<(), ModuleCycle>
    where
        F: FnMut(&Arc<ProjectFacade>) -> ControlFlow<()>,
    {
        let mut seen = FxHashSet::default();
        let mut ancestors: Vec<DescriptorId> = Vec::new();
        let mut stack = vec![(root.clone(), 0usize)];
        while let Some((current, depth)) = stack.pop() {
            ancestors.truncate(depth);
            if ancestors.contains(&current) {
                return Err(ModuleCycle(current));
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(facade) = self.facades.get(&current) else {
                continue;
            };
            if visit(facade).is_break() {
                return Ok(());
            }
            if let Some(children) = self.modules.get(&current) {
                stack.extend(children.iter().rev().map(|c| (c.clone(), depth + 1)));
            }
            ancestors.push(current);
        }
        Ok(())
    }

    /// Drop every facade and index.
    pub fn clear(&mut self) {
        self.facades.clear();
        self.artifacts.clear();
        self.dependencies.clear();
        self.modules.clear();
        self.workspace_modules.clear();
    }
}
