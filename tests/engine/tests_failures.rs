//! Resolver failures, unsatisfied edges and collaborator failures.

use crate::helpers::fixtures::*;
use crate::helpers::recorders::{RecordingIndex, RecordingMarkers, assert_edges_consistent};
use crate::helpers::workspace::{FakeWorkspace, missing};
use parking_lot::Mutex;
use pomgraph::base::ArtifactKey;
use pomgraph::project::{Diagnostic, ResolverConfiguration};
use pomgraph::refresh::{ChangeKind, IndexDocument, IndexError, IndexScope, ProjectIndex};
use pomgraph::registry::{EdgeKind, ProjectRegistry};
use std::path::Path;
use std::sync::{Arc, OnceLock};

#[test]
fn test_failed_resolution_removes_facade_and_records_markers() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.put("a/pom.xml", module("a", "1.0", &[]));
    ws.put("b/pom.xml", module("b", "1.0", &["a"]));
    let markers = Arc::new(RecordingMarkers::default());
    let manager = manager(&ws).with_markers(markers.clone());
    refresh(&manager, &["a/pom.xml", "b/pom.xml"]);

    ws.fail("a/pom.xml", vec![Diagnostic::error("malformed descriptor")]);
    let summary = refresh(&manager, &["a/pom.xml"]);

    assert_eq!(summary.failed, 1);
    assert!(manager.get_facade(&id("a/pom.xml")).is_none());
    let event = summary.events.iter().find(|e| e.id() == &id("a/pom.xml")).unwrap();
    assert_eq!(event.kind(), ChangeKind::Removed);
    assert_eq!(*markers.failed.lock(), vec![id("a/pom.xml")]);
    assert!(markers.cleared.lock().contains(&id("a/pom.xml")));
    assert_eq!(ws.resolutions_of("b/pom.xml"), 2);
    manager.registry().read(assert_edges_consistent);
}

#[test]
fn test_missing_artifact_edge_triggers_later_resolution() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.fail("b/pom.xml", missing(key("a", "1.0")));
    let manager = manager(&ws);

    let summary = refresh(&manager, &["b/pom.xml"]);
    assert_eq!(summary.failed, 1);
    assert!(summary.events.is_empty());
    manager.registry().read(|state| {
        let waiting: Vec<_> = state
            .dependency_index()
            .dependents_of_kind(&key("a", "1.0"), EdgeKind::Missing)
            .cloned()
            .collect();
        assert_eq!(waiting, vec![id("b/pom.xml")]);
    });

    ws.put("a/pom.xml", module("a", "1.0", &[]));
    ws.put("b/pom.xml", module("b", "1.0", &["a"]));
    let summary = refresh(&manager, &["a/pom.xml"]);

    assert_eq!(summary.refreshed, 2);
    assert!(manager.get_facade(&id("b/pom.xml")).is_some());
    manager.registry().read(|state| {
        let index = state.dependency_index();
        assert_eq!(index.dependents_of_kind(&key("a", "1.0"), EdgeKind::Missing).count(), 0);
        assert_eq!(index.dependents_of_kind(&key("a", "1.0"), EdgeKind::Workspace).count(), 1);
    });
}

/// Index that, on every removal, records how many descriptors the registry
/// shows waiting on the removed key's missing dependency `wanted`.
struct WaitingEdgeIndex {
    registry: OnceLock<Arc<ProjectRegistry>>,
    wanted: ArtifactKey,
    seen: Mutex<Vec<usize>>,
}

impl ProjectIndex for WaitingEdgeIndex {
    fn add_document(&self, _scope: IndexScope, _document: &IndexDocument) -> Result<(), IndexError> {
        Ok(())
    }

    fn remove_document(
        &self,
        _scope: IndexScope,
        _file: &Path,
        _key: &ArtifactKey,
    ) -> Result<(), IndexError> {
        if let Some(registry) = self.registry.get() {
            let waiting = registry.read(|state| {
                state
                    .dependency_index()
                    .dependents_of_kind(&self.wanted, EdgeKind::Missing)
                    .count()
            });
            self.seen.lock().push(waiting);
        }
        Ok(())
    }
}

#[test]
fn test_failed_descriptor_is_replaced_by_missing_edges_in_one_step() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.put("b/pom.xml", module("b", "1.0", &["a"]));
    let index = Arc::new(WaitingEdgeIndex {
        registry: OnceLock::new(),
        wanted: key("a", "1.0"),
        seen: Mutex::new(Vec::new()),
    });
    let manager = manager(&ws).with_index(index.clone());
    assert!(index.registry.set(manager.registry().clone()).is_ok());
    refresh(&manager, &["b/pom.xml"]);

    ws.fail("b/pom.xml", missing(key("a", "1.0")));
    refresh(&manager, &["b/pom.xml"]);

    // By the time the old facade leaves the index, its missing edge is already visible.
    assert_eq!(*index.seen.lock(), vec![1]);
    assert!(manager.get_facade(&id("b/pom.xml")).is_none());
}

#[test]
fn test_missing_edges_need_workspace_resolution() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.fail("b/pom.xml", missing(key("a", "1.0")));
    ws.configure(
        "b/pom.xml",
        ResolverConfiguration::default().with_workspace_resolution(false),
    );
    let manager = manager(&ws);

    refresh(&manager, &["b/pom.xml"]);

    manager
        .registry()
        .read(|state| assert!(state.dependency_index().is_empty()));
}

#[test]
fn test_untracked_inaccessible_descriptor_is_ignored() {
    let ws = Arc::new(FakeWorkspace::new());
    let manager = manager(&ws);

    let summary = refresh(&manager, &["ghost/pom.xml"]);

    assert_eq!(summary.removed, 0);
    assert!(summary.events.is_empty());
    assert!(ws.calls().is_empty());
}

#[test]
fn test_index_tracks_added_and_removed_projects() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.put("a/pom.xml", module("a", "1.0", &[]));
    let index = Arc::new(RecordingIndex::default());
    let manager = manager(&ws).with_index(index.clone());

    refresh(&manager, &["a/pom.xml"]);
    ws.put("a/pom.xml", module("a", "2.0", &[]));
    refresh(&manager, &["a/pom.xml"]);
    ws.delete("a/pom.xml");
    refresh(&manager, &["a/pom.xml"]);

    assert_eq!(*index.added.lock(), vec![key("a", "1.0"), key("a", "2.0")]);
    assert_eq!(*index.removed.lock(), vec![key("a", "1.0"), key("a", "2.0")]);
}

#[test]
fn test_index_failures_are_not_fatal() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.put("a/pom.xml", module("a", "1.0", &[]));
    let index = Arc::new(RecordingIndex {
        reject: true,
        ..RecordingIndex::default()
    });
    let manager = manager(&ws).with_index(index);

    let summary = refresh(&manager, &["a/pom.xml"]);

    assert_eq!(summary.refreshed, 1);
    assert!(manager.get_facade(&id("a/pom.xml")).is_some());
}
