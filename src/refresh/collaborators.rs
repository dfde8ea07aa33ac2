//! Out-of-band collaborators notified by the engine: the project index and the
//! diagnostic marker sink. Failures here are logged and never abort a batch.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::base::{ArtifactKey, DescriptorId};
use crate::project::{FileStamp, ResolveFailure};

use super::error::IndexError;

// ============================================================================
// INDEX
// ============================================================================

/// Index partition a document belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexScope {
    /// Modules tracked in the workspace.
    Workspace,
    /// Artifacts from a local repository.
    Local,
}

/// One tracked descriptor as seen by the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDocument {
    pub file: PathBuf,
    pub key: ArtifactKey,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl IndexDocument {
    /// Document for `key` published by `file`, stamped from disk.
    pub fn capture(file: PathBuf, key: ArtifactKey) -> Self {
        let stamp = FileStamp::capture(&file);
        Self {
            file,
            key,
            size: stamp.len.unwrap_or(0),
            modified: stamp.modified,
        }
    }
}

/// Search index kept in step with tracked facades.
pub trait ProjectIndex: Send + Sync {
    fn add_document(&self, scope: IndexScope, document: &IndexDocument) -> Result<(), IndexError>;

    fn remove_document(
        &self,
        scope: IndexScope,
        file: &std::path::Path,
        key: &ArtifactKey,
    ) -> Result<(), IndexError>;
}

/// Index that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIndex;

impl ProjectIndex for NoopIndex {
    fn add_document(&self, _: IndexScope, _: &IndexDocument) -> Result<(), IndexError> {
        Ok(())
    }

    fn remove_document(
        &self,
        _: IndexScope,
        _: &std::path::Path,
        _: &ArtifactKey,
    ) -> Result<(), IndexError> {
        Ok(())
    }
}

// ============================================================================
// MARKERS
// ============================================================================

/// Receives per-descriptor diagnostics.
pub trait MarkerSink: Send + Sync {
    /// Called before a descriptor is recomputed.
    fn delete_markers(&self, id: &DescriptorId);

    /// Called when resolution of `id` fails.
    fn add_markers(&self, id: &DescriptorId, failure: &ResolveFailure);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMarkers;

impl MarkerSink for NoopMarkers {
    fn delete_markers(&self, _: &DescriptorId) {}

    fn add_markers(&self, _: &DescriptorId, _: &ResolveFailure) {}
}
