//! The refresh engine.
//!
//! [`ProjectManager`] drains refresh requests one descriptor at a time: it
//! skips descriptors whose facade is still current, re-resolves the rest,
//! reconciles nested modules, forces the dependents of anything whose
//! dependency surface changed, and commits each replacement to the shared
//! registry in one write section. Events are merged per descriptor and flushed
//! once when the whole batch completes.

use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::base::{ArtifactKey, DescriptorId};
use crate::project::{
    DescriptorResolver, DescriptorSource, ProjectFacade, ResolveFailure, ResolvedDependency,
    UpdateFlags,
};
use crate::registry::{EdgeKind, FxIndexSet, ProjectRegistry};

use super::changes::has_dependency_change;
use super::collaborators::{
    IndexDocument, IndexScope, MarkerSink, NoopIndex, NoopMarkers, ProjectIndex,
};
use super::context::{RefreshContext, RefreshRequest};
use super::error::{RefreshError, Result};
use super::events::{ChangeEventAggregator, ChangeFlags, ChangeKind, ProjectChangedEvent};
use super::listeners::{ListenerSet, ProjectChangedListener};
use super::monitor::RefreshMonitor;

/// What a completed batch did.
#[derive(Clone, Debug, Default)]
pub struct RefreshSummary {
    /// Descriptors re-resolved and committed.
    pub refreshed: usize,
    /// Descriptors skipped because their facade was current.
    pub skipped: usize,
    /// Facades removed, nested modules included.
    pub removed: usize,
    /// Descriptors whose resolution failed.
    pub failed: usize,
    /// Events delivered to listeners.
    pub events: Vec<ProjectChangedEvent>,
}

/// Mutable state of one batch in flight.
struct Batch<'m> {
    context: RefreshContext,
    events: ChangeEventAggregator,
    summary: RefreshSummary,
    monitor: &'m RefreshMonitor,
}

/// Owns the registry and drives refresh batches against it.
///
/// Reads (`get_facade`, `facades`, `project_for_artifact`) never wait for a
/// batch. Batches are serialized with each other.
pub struct ProjectManager {
    registry: Arc<ProjectRegistry>,
    resolver: Arc<dyn DescriptorResolver>,
    source: Arc<dyn DescriptorSource>,
    index: Arc<dyn ProjectIndex>,
    markers: Arc<dyn MarkerSink>,
    listeners: ListenerSet,
    batch_lock: Mutex<()>,
}

impl ProjectManager {
    pub fn new(resolver: Arc<dyn DescriptorResolver>, source: Arc<dyn DescriptorSource>) -> Self {
        Self {
            registry: Arc::new(ProjectRegistry::new()),
            resolver,
            source,
            index: Arc::new(NoopIndex),
            markers: Arc::new(NoopMarkers),
            listeners: ListenerSet::new(),
            batch_lock: Mutex::new(()),
        }
    }

    pub fn with_index(mut self, index: Arc<dyn ProjectIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn with_markers(mut self, markers: Arc<dyn MarkerSink>) -> Self {
        self.markers = markers;
        self
    }

    /// Shared registry, for readers on other threads.
    pub fn registry(&self) -> &Arc<ProjectRegistry> {
        &self.registry
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_facade(&self, id: &DescriptorId) -> Option<Arc<ProjectFacade>> {
        self.registry.get_facade(id)
    }

    pub fn facades(&self) -> Vec<Arc<ProjectFacade>> {
        self.registry.facades()
    }

    /// Tracked facade publishing `key`.
    pub fn project_for_artifact(&self, key: &ArtifactKey) -> Option<Arc<ProjectFacade>> {
        self.registry.facade_for_artifact(key)
    }

    /// First dependency matching `key` (classifier included) declared by the
    /// facade for `id` or any of its nested modules, depth-first.
    pub fn find_artifact(
        &self,
        id: &DescriptorId,
        key: &ArtifactKey,
    ) -> Option<(Arc<ProjectFacade>, ResolvedDependency)> {
        self.registry.read(|state| {
            let mut found = None;
            let walk = state.visit_nested(id, |facade| match facade.find_dependency(key) {
                Some(dependency) => {
                    found = Some((facade.clone(), dependency.clone()));
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            });
            if let Err(err) = walk {
                warn!(descriptor = %id, error = %err, "artifact search stopped");
            }
            found
        })
    }

    /// Cached facade for `id`; when none is tracked and `load` is set, resolve
    /// the descriptor offline without registering the result.
    pub fn create(
        &self,
        id: &DescriptorId,
        load: bool,
        monitor: &RefreshMonitor,
    ) -> std::result::Result<Option<Arc<ProjectFacade>>, ResolveFailure> {
        if let Some(facade) = self.registry.get_facade(id) {
            return Ok(Some(facade));
        }
        if !load {
            return Ok(None);
        }
        let configuration = self.source.resolver_configuration(id);
        let token = self.source.staleness_token(id);
        let snapshot = self.resolver.resolve(
            id,
            &configuration,
            UpdateFlags::offline(),
            monitor.cancel_token(),
        )?;
        Ok(Some(Arc::new(ProjectFacade::new(
            id.clone(),
            snapshot,
            configuration,
            token,
        ))))
    }

    // ========================================================================
    // LISTENERS
    // ========================================================================

    /// Returns false if `listener` was already registered.
    pub fn add_listener(&self, listener: Arc<dyn ProjectChangedListener>) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ProjectChangedListener>) -> bool {
        self.listeners.remove(listener)
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Run one batch: drain each request in turn, then notify listeners once.
    ///
    /// On cancellation returns [`RefreshError::Interrupted`]. Descriptors
    /// committed before that point stay committed and no listener is called.
    pub fn refresh(
        &self,
        requests: impl IntoIterator<Item = RefreshRequest>,
        monitor: &RefreshMonitor,
    ) -> Result<RefreshSummary> {
        let _batch_guard = self.batch_lock.lock();
        let mut requests = requests.into_iter();
        let Some(first) = requests.next() else {
            return Ok(RefreshSummary::default());
        };

        let mut batch = Batch {
            context: RefreshContext::new(&first),
            events: ChangeEventAggregator::new(),
            summary: RefreshSummary::default(),
            monitor,
        };
        debug!(pending = batch.context.len(), "refresh batch started");

        let outcome = self.drain(&mut batch).and_then(|()| {
            for request in requests {
                batch.context.next_request(&request);
                self.drain(&mut batch)?;
            }
            Ok(())
        });
        monitor.done();

        if let Err(err) = outcome {
            debug!(
                discarded = batch.events.len(),
                "refresh batch interrupted; pending events dropped"
            );
            batch.events.discard();
            return Err(err);
        }

        let listeners = self.listeners.snapshot();
        batch.summary.events = batch.events.flush(&listeners, monitor);
        let summary = batch.summary;
        debug!(
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            removed = summary.removed,
            failed = summary.failed,
            events = summary.events.len(),
            "refresh batch finished"
        );
        Ok(summary)
    }

    fn drain(&self, batch: &mut Batch<'_>) -> Result<()> {
        while let Some(id) = batch.context.pop() {
            if batch.monitor.is_cancelled() {
                return Err(RefreshError::Interrupted);
            }
            trace!(descriptor = %id, "pop");
            batch.monitor.sub_task(&id);

            if self.source.is_accessible(&id) {
                self.refresh_one(&id, batch)?;
            } else {
                trace!(descriptor = %id, "descriptor inaccessible; removing");
                batch.context.mark_processed(&id);
                self.remove_tracked(&id, &[], batch);
            }
            batch.monitor.worked(1);
        }
        Ok(())
    }

    fn refresh_one(&self, id: &DescriptorId, batch: &mut Batch<'_>) -> Result<()> {
        let old = self.registry.get_facade(id);
        let token = self.source.staleness_token(id);

        if !batch.context.is_forced(id) {
            if let Some(old) = &old {
                if !old.is_stale(&token) {
                    trace!(descriptor = %id, "facade up to date; skipped");
                    batch.summary.skipped += 1;
                    return Ok(());
                }
            }
        }

        batch.context.mark_processed(id);
        self.markers.delete_markers(id);
        let configuration = self.source.resolver_configuration(id);
        let resolved = self.resolver.resolve(
            id,
            &configuration,
            batch.context.flags(),
            batch.monitor.cancel_token(),
        );
        if batch.monitor.is_cancelled() {
            return Err(RefreshError::Interrupted);
        }

        let snapshot = match resolved {
            Ok(snapshot) => snapshot,
            Err(failure) => {
                warn!(descriptor = %id, error = %failure, "resolution failed");
                self.markers.add_markers(id, &failure);
                batch.summary.failed += 1;
                let missing: Vec<ArtifactKey> = if configuration.resolve_workspace_projects {
                    failure.missing_artifacts().cloned().collect()
                } else {
                    Vec::new()
                };
                self.remove_tracked(id, &missing, batch);
                return Ok(());
            }
        };

        let new = Arc::new(ProjectFacade::new(
            id.clone(),
            snapshot,
            configuration,
            token,
        ));
        let dependency_changed = has_dependency_change(old.as_ref(), Some(&new));
        let include_modules = new.configuration().include_modules;

        let dropped = self.reconcile_modules(id, old.as_ref(), &new, batch);

        if dependency_changed {
            let mut dependents = self.registry.read(|state| {
                let mut dependents = old
                    .as_ref()
                    .map(|old| state.get_dependents(id, old, include_modules))
                    .unwrap_or_default();
                dependents.extend(state.get_dependents(id, &new, include_modules));
                dependents
            });
            dependents.retain(|d| !dropped.contains(d));
            trace!(descriptor = %id, count = dependents.len(), "dependency change; forcing dependents");
            batch.context.force(dependents);
        }

        self.registry.write(|state| {
            state.remove_facade(id);
            state.add_facade(new.clone());
            if let Some(parent) = new.parent_key() {
                state.add_workspace_module_edges(id, new.modules().iter().map(String::as_str));
                if new.configuration().resolve_workspace_projects {
                    state.add_dependency_edge(id, parent, EdgeKind::Workspace);
                }
            }
        });

        let kind = if old.is_some() {
            ChangeKind::Changed
        } else {
            ChangeKind::Added
        };
        let flags = if dependency_changed {
            ChangeFlags::DEPENDENCIES
        } else {
            ChangeFlags::NONE
        };
        batch
            .events
            .record(id, kind, flags, old.clone(), Some(new.clone()));
        batch.summary.refreshed += 1;

        if let Some(old) = &old {
            self.unindex(old);
        }
        self.index(&new);
        Ok(())
    }

    /// Bring tracked modules in line with `new`'s declarations. Returns the
    /// nested modules that were removed.
    fn reconcile_modules(
        &self,
        id: &DescriptorId,
        old: Option<&Arc<ProjectFacade>>,
        new: &Arc<ProjectFacade>,
        batch: &mut Batch<'_>,
    ) -> FxIndexSet<DescriptorId> {
        if new.configuration().include_modules {
            let children: FxIndexSet<DescriptorId> = new.nested_modules().collect();
            let dropped: FxIndexSet<DescriptorId> = self.registry.read(|state| {
                state
                    .nested_modules(id)
                    .filter(|child| !children.contains(*child))
                    .cloned()
                    .collect()
            });
            for child in &dropped {
                trace!(parent = %id, module = %child, "module no longer declared");
                self.remove_tracked(child, &[], batch);
            }
            batch.context.force(children);
            dropped
        } else {
            let shadow = self.registry.write(|state| {
                let mut paths = state.remove_workspace_module_edges(id);
                paths.extend(old.into_iter().flat_map(|old| old.module_paths()));
                paths.extend(new.module_paths());
                paths.retain(|path| path != id && state.get_facade(path).is_some());
                paths
            });
            batch.context.force(shadow);
            FxIndexSet::default()
        }
    }

    /// Stop tracking `id` and every nested module reachable from it, force their
    /// dependents and record `Removed` events.
    ///
    /// `missing` are unsatisfied dependencies of `id`, recorded as
    /// [`EdgeKind::Missing`] edges in the same write section as the removal.
    fn remove_tracked(&self, id: &DescriptorId, missing: &[ArtifactKey], batch: &mut Batch<'_>) {
        let (removed, affected) = self.registry.write(|state| {
            let mut doomed = Vec::new();
            let walk = state.visit_nested(id, |facade| {
                doomed.push(facade.clone());
                ControlFlow::Continue(())
            });
            if let Err(cycle) = walk {
                let err = RefreshError::from(cycle);
                warn!(descriptor = %id, error = %err, "nested module removal stopped");
            }

            let mut affected = FxIndexSet::default();
            for facade in &doomed {
                affected.extend(state.get_dependents(facade.id(), facade, false));
            }

            let mut removed = Vec::with_capacity(doomed.len());
            affected.extend(state.remove_workspace_module_edges(id));
            if state.remove_facade(id).is_none() {
                trace!(descriptor = %id, "not tracked; stale edges purged");
            }
            for facade in doomed {
                let nested = facade.id();
                if nested != id {
                    affected.extend(state.remove_workspace_module_edges(nested));
                    state.remove_facade(nested);
                }
                removed.push(facade);
            }

            for key in missing {
                state.add_dependency_edge(id, key, EdgeKind::Missing);
            }

            affected.retain(|path| state.get_facade(path).is_some());
            (removed, affected)
        });

        for facade in &removed {
            batch
                .events
                .record(facade.id(), ChangeKind::Removed, ChangeFlags::NONE, Some(facade.clone()), None);
            batch.summary.removed += 1;
            self.unindex(facade);
        }
        batch.context.force(affected);
    }

    fn index(&self, facade: &ProjectFacade) {
        let document = IndexDocument::capture(
            self.source.descriptor_file(facade.id()),
            facade.artifact_key().clone(),
        );
        if let Err(err) = self.index.add_document(IndexScope::Workspace, &document) {
            warn!(descriptor = %facade.id(), error = %err, "failed to index project");
        }
    }

    fn unindex(&self, facade: &ProjectFacade) {
        let file = self.source.descriptor_file(facade.id());
        if let Err(err) = self
            .index
            .remove_document(IndexScope::Workspace, &file, facade.artifact_key())
        {
            warn!(descriptor = %facade.id(), error = %err, "failed to remove project from index");
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Drop every listener and tracked facade. Waits for a running batch.
    pub fn shutdown(&self) {
        let _batch_guard = self.batch_lock.lock();
        self.listeners.clear();
        self.registry.clear();
        debug!("project manager shut down");
    }
}

impl std::fmt::Debug for ProjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectManager")
            .field("projects", &self.registry.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
