//! # pomgraph-base
//!
//! Incremental project registry and refresh engine for multi-module build
//! workspaces.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! refresh   → Worklist engine, change events, listeners, cancellation
//!   ↓
//! registry  → Facade graph, reverse dependency index, module indices
//!   ↓
//! project   → Facades, resolver and descriptor-source contracts, configuration
//!   ↓
//! base      → Primitives (DescriptorId, ArtifactKey, module path rules)
//! ```

// ============================================================================
// MODULES (dependency order: base → project → registry → refresh)
// ============================================================================

/// Foundation types: DescriptorId, ArtifactKey
pub mod base;

/// Per-descriptor model and external collaborator contracts
pub mod project;

/// In-memory graph of tracked facades
pub mod registry;

/// Refresh batches: worklist, cascade, events
pub mod refresh;

// Re-export foundation types
pub use base::{ArtifactKey, DescriptorId};

// Re-export the entry points
pub use project::{DescriptorResolver, DescriptorSource, ProjectFacade, ResolverConfiguration};
pub use refresh::{
    ProjectChangedEvent, ProjectChangedListener, ProjectManager, RefreshError, RefreshMonitor,
    RefreshRequest, RefreshSummary,
};
pub use registry::ProjectRegistry;
