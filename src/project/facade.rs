//! Project facade: the resolved, cached snapshot of one descriptor.
//!
//! A facade is immutable once built. The registry hands out `Arc<ProjectFacade>`
//! so readers always observe a whole facade, old or new, never a mix.

use std::path::{Path, PathBuf};

use crate::base::{ArtifactKey, DescriptorId};

use super::config::ResolverConfiguration;
use super::source::StalenessToken;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One resolved dependency, in resolver order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub key: ArtifactKey,
    /// Resolved artifact file, if the resolver located one.
    pub file: Option<PathBuf>,
    pub optional: bool,
}

impl ResolvedDependency {
    pub fn new(key: ArtifactKey) -> Self {
        Self {
            key,
            file: None,
            optional: false,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// Parent reference of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub key: ArtifactKey,
    /// Descriptor file the parent was resolved from.
    pub file: Option<PathBuf>,
}

/// Build plugin declared by a module. Extension plugins take part in resolution
/// and are tracked as dependency edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlugin {
    pub key: ArtifactKey,
    pub extensions: bool,
}

/// What the resolver computed for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSnapshot {
    pub artifact: ArtifactKey,
    pub parent: Option<ParentRef>,
    pub dependencies: Vec<ResolvedDependency>,
    /// Declared nested-module names, as written in the descriptor.
    pub modules: Vec<String>,
    pub build_plugins: Vec<BuildPlugin>,
}

impl ResolvedSnapshot {
    pub fn new(artifact: ArtifactKey) -> Self {
        Self {
            artifact,
            parent: None,
            dependencies: Vec::new(),
            modules: Vec::new(),
            build_plugins: Vec::new(),
        }
    }

    pub fn with_parent(mut self, key: ArtifactKey, file: Option<PathBuf>) -> Self {
        self.parent = Some(ParentRef { key, file });
        self
    }

    pub fn with_dependency(mut self, dependency: ResolvedDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.modules.push(name.into());
        self
    }

    pub fn with_build_plugin(mut self, key: ArtifactKey, extensions: bool) -> Self {
        self.build_plugins.push(BuildPlugin { key, extensions });
        self
    }
}

// ============================================================================
// FACADE
// ============================================================================

/// Resolved state of one tracked descriptor.
#[derive(Debug)]
pub struct ProjectFacade {
    id: DescriptorId,
    snapshot: ResolvedSnapshot,
    configuration: ResolverConfiguration,
    staleness: StalenessToken,
}

impl ProjectFacade {
    pub fn new(
        id: DescriptorId,
        snapshot: ResolvedSnapshot,
        configuration: ResolverConfiguration,
        staleness: StalenessToken,
    ) -> Self {
        Self {
            id,
            snapshot,
            configuration,
            staleness,
        }
    }

    pub fn id(&self) -> &DescriptorId {
        &self.id
    }

    pub fn descriptor_path(&self) -> &Path {
        self.id.as_path()
    }

    pub fn snapshot(&self) -> &ResolvedSnapshot {
        &self.snapshot
    }

    pub fn artifact_key(&self) -> &ArtifactKey {
        &self.snapshot.artifact
    }

    pub fn parent(&self) -> Option<&ParentRef> {
        self.snapshot.parent.as_ref()
    }

    pub fn parent_key(&self) -> Option<&ArtifactKey> {
        self.snapshot.parent.as_ref().map(|p| &p.key)
    }

    pub fn dependencies(&self) -> &[ResolvedDependency] {
        &self.snapshot.dependencies
    }

    pub fn modules(&self) -> &[String] {
        &self.snapshot.modules
    }

    pub fn configuration(&self) -> &ResolverConfiguration {
        &self.configuration
    }

    pub fn staleness(&self) -> &StalenessToken {
        &self.staleness
    }

    /// A facade is stale when its inputs no longer match `current`.
    pub fn is_stale(&self, current: &StalenessToken) -> bool {
        &self.staleness != current
    }

    /// Keys this facade depends on: declared dependencies, then extension plugins.
    pub fn dependency_keys(&self) -> impl Iterator<Item = &ArtifactKey> {
        self.snapshot.dependencies.iter().map(|d| &d.key).chain(
            self.snapshot
                .build_plugins
                .iter()
                .filter(|p| p.extensions)
                .map(|p| &p.key),
        )
    }

    /// Whether `key` is a dependency, an extension plugin or the parent of this facade.
    pub fn references(&self, key: &ArtifactKey) -> bool {
        self.parent_key() == Some(key) || self.dependency_keys().any(|k| k == key)
    }

    /// Workspace paths implied by every declared module name.
    pub fn module_paths(&self) -> impl Iterator<Item = DescriptorId> + '_ {
        self.snapshot
            .modules
            .iter()
            .filter_map(|name| self.id.module(name))
    }

    /// Declared modules that live under this descriptor's directory.
    pub fn nested_modules(&self) -> impl Iterator<Item = DescriptorId> + '_ {
        self.module_paths()
            .filter(|child| child.is_nested_under(&self.id))
    }

    /// First dependency whose key matches exactly, classifier included.
    pub fn find_dependency(&self, key: &ArtifactKey) -> Option<&ResolvedDependency> {
        self.snapshot.dependencies.iter().find(|d| &d.key == key)
    }
}
