//! Descriptor source: accessibility, staleness and configuration of descriptors.
//!
//! The registry never touches the filesystem itself. Everything it needs to know
//! about a descriptor on disk comes through [`DescriptorSource`].

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::base::DescriptorId;
use crate::base::constants::{DESCRIPTOR_FILE_NAME, METADATA_COMPANIONS};

use super::config::ResolverConfiguration;

// ============================================================================
// STALENESS
// ============================================================================

/// Recorded state of one input file. Missing files are recorded as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: Option<u64>,
}

impl FileStamp {
    /// Stamp `path` from filesystem metadata.
    pub fn capture(path: &Path) -> Self {
        let metadata = std::fs::metadata(path).ok();
        Self {
            path: path.to_path_buf(),
            modified: metadata.as_ref().and_then(|m| m.modified().ok()),
            len: metadata.as_ref().map(|m| m.len()),
        }
    }
}

/// Snapshot of a descriptor's inputs at the time its facade was computed.
///
/// Two tokens compare equal iff every stamped input is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StalenessToken {
    stamps: Vec<FileStamp>,
    revision: u64,
}

impl StalenessToken {
    pub fn from_stamps(stamps: impl IntoIterator<Item = FileStamp>) -> Self {
        Self {
            stamps: stamps.into_iter().collect(),
            revision: 0,
        }
    }

    /// Token for sources that track changes with a counter instead of files.
    pub fn from_revision(revision: u64) -> Self {
        Self {
            stamps: Vec::new(),
            revision,
        }
    }

    /// Stamp every path in order.
    pub fn capture<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Self {
        Self::from_stamps(paths.into_iter().map(FileStamp::capture))
    }

    pub fn stamps(&self) -> &[FileStamp] {
        &self.stamps
    }
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

/// Where the engine learns about descriptors outside the registry.
pub trait DescriptorSource: Send + Sync {
    /// Whether the descriptor exists and its owning container is eligible for tracking.
    fn is_accessible(&self, id: &DescriptorId) -> bool;

    /// Current state of the descriptor and its metadata companions.
    fn staleness_token(&self, id: &DescriptorId) -> StalenessToken;

    /// Configuration the resolver should use for `id`.
    fn resolver_configuration(&self, _id: &DescriptorId) -> ResolverConfiguration {
        ResolverConfiguration::default()
    }

    /// File handed to the index collaborator for `id`.
    fn descriptor_file(&self, id: &DescriptorId) -> PathBuf {
        id.as_path().to_path_buf()
    }
}

// ============================================================================
// FILESYSTEM SOURCE
// ============================================================================

/// Options for [`FsDescriptorSource`].
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Descriptor file name expected in each module directory.
    pub descriptor_file_name: String,
    /// Files, relative to the descriptor's directory, that feed the staleness token.
    pub metadata_companions: Vec<PathBuf>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            descriptor_file_name: DESCRIPTOR_FILE_NAME.to_string(),
            metadata_companions: METADATA_COMPANIONS.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Descriptor source backed by a workspace directory.
///
/// Descriptor identities are paths relative to `root`. A container (directory) can
/// be marked ineligible, which makes every descriptor below it inaccessible.
#[derive(Debug)]
pub struct FsDescriptorSource {
    root: PathBuf,
    options: SourceOptions,
    configurations: RwLock<FxHashMap<DescriptorId, ResolverConfiguration>>,
    ineligible: RwLock<FxHashSet<PathBuf>>,
}

impl FsDescriptorSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_options(root, SourceOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: SourceOptions) -> Self {
        Self {
            root: root.into(),
            options,
            configurations: RwLock::new(FxHashMap::default()),
            ineligible: RwLock::new(FxHashSet::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    /// Identity of the descriptor in `dir` (relative to the root).
    pub fn descriptor_in(&self, dir: impl AsRef<Path>) -> DescriptorId {
        DescriptorId::new(dir.as_ref().join(&self.options.descriptor_file_name))
    }

    /// Override the resolver configuration for one descriptor.
    pub fn set_configuration(&self, id: DescriptorId, configuration: ResolverConfiguration) {
        self.configurations.write().insert(id, configuration);
    }

    /// Mark a container directory (relative to the root) as eligible or not.
    pub fn set_eligible(&self, container: impl Into<PathBuf>, eligible: bool) {
        let container = container.into();
        let mut ineligible = self.ineligible.write();
        if eligible {
            ineligible.remove(&container);
        } else {
            ineligible.insert(container);
        }
    }

    fn absolute(&self, id: &DescriptorId) -> PathBuf {
        self.root.join(id.as_path())
    }

    fn input_files(&self, id: &DescriptorId) -> Vec<PathBuf> {
        let dir = self.root.join(id.directory());
        std::iter::once(self.absolute(id))
            .chain(self.options.metadata_companions.iter().map(|c| dir.join(c)))
            .collect()
    }
}

impl DescriptorSource for FsDescriptorSource {
    fn is_accessible(&self, id: &DescriptorId) -> bool {
        let excluded = self
            .ineligible
            .read()
            .iter()
            .any(|container| id.directory().starts_with(container));
        !excluded && self.absolute(id).is_file()
    }

    fn staleness_token(&self, id: &DescriptorId) -> StalenessToken {
        let files = self.input_files(id);
        StalenessToken::capture(files.iter().map(PathBuf::as_path))
    }

    fn resolver_configuration(&self, id: &DescriptorId) -> ResolverConfiguration {
        self.configurations
            .read()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn descriptor_file(&self, id: &DescriptorId) -> PathBuf {
        self.absolute(id)
    }
}
