//! Collaborators and listeners that record what the engine told them.

use parking_lot::Mutex;
use pomgraph::base::{ArtifactKey, DescriptorId};
use pomgraph::project::ResolveFailure;
use pomgraph::refresh::{
    IndexDocument, IndexError, IndexScope, ListenerError, MarkerSink, ProjectChangedEvent,
    ProjectChangedListener, ProjectIndex, RefreshMonitor,
};
use pomgraph::registry::{EdgeKind, WorkspaceState};
use std::path::Path;
use std::sync::Arc;

/// Listener keeping every delivered batch.
#[derive(Default)]
pub struct RecordingListener {
    batches: Mutex<Vec<Vec<ProjectChangedEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn batches(&self) -> Vec<Vec<ProjectChangedEvent>> {
        self.batches.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Events of the most recent batch.
    pub fn last(&self) -> Vec<ProjectChangedEvent> {
        self.batches.lock().last().cloned().unwrap_or_default()
    }
}

impl ProjectChangedListener for RecordingListener {
    fn projects_changed(
        &self,
        events: &[ProjectChangedEvent],
        _monitor: &RefreshMonitor,
    ) -> Result<(), ListenerError> {
        self.batches.lock().push(events.to_vec());
        Ok(())
    }
}

/// Index collecting documents, optionally rejecting every call.
#[derive(Default)]
pub struct RecordingIndex {
    pub added: Mutex<Vec<ArtifactKey>>,
    pub removed: Mutex<Vec<ArtifactKey>>,
    pub reject: bool,
}

impl ProjectIndex for RecordingIndex {
    fn add_document(&self, _scope: IndexScope, document: &IndexDocument) -> Result<(), IndexError> {
        self.added.lock().push(document.key.clone());
        if self.reject {
            return Err(IndexError::Io(std::io::Error::other("index offline")));
        }
        Ok(())
    }

    fn remove_document(
        &self,
        _scope: IndexScope,
        _file: &Path,
        key: &ArtifactKey,
    ) -> Result<(), IndexError> {
        self.removed.lock().push(key.clone());
        if self.reject {
            return Err(IndexError::Io(std::io::Error::other("index offline")));
        }
        Ok(())
    }
}

/// Marker sink recording which descriptors failed.
#[derive(Default)]
pub struct RecordingMarkers {
    pub failed: Mutex<Vec<DescriptorId>>,
    pub cleared: Mutex<Vec<DescriptorId>>,
}

impl MarkerSink for RecordingMarkers {
    fn delete_markers(&self, id: &DescriptorId) {
        self.cleared.lock().push(id.clone());
    }

    fn add_markers(&self, id: &DescriptorId, _failure: &ResolveFailure) {
        self.failed.lock().push(id.clone());
    }
}

/// Every resolved edge must come from a tracked facade declaring the key.
pub fn assert_edges_consistent(state: &WorkspaceState) {
    let index = state.dependency_index();
    for key in index.keys() {
        for kind in [EdgeKind::Workspace, EdgeKind::External] {
            for source in index.dependents_of_kind(key, kind) {
                let facade = state
                    .get_facade(source)
                    .unwrap_or_else(|| panic!("edge {source} -> {key} without a facade"));
                assert!(facade.references(key), "edge {source} -> {key} not declared");
            }
        }
    }
}
