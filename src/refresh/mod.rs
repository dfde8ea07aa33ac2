//! # Refresh
//!
//! Batch recomputation of tracked descriptors.
//!
//! A caller submits [`RefreshRequest`]s to [`ProjectManager::refresh`]. The engine
//! drains them through a [`RefreshContext`] worklist, consulting the
//! [`DescriptorResolver`](crate::project::DescriptorResolver) only for descriptors
//! that are forced or stale, and cascades to dependents when
//! [`has_dependency_change`] reports a change. Changes are merged per descriptor by
//! the [`ChangeEventAggregator`] and delivered once per batch to every
//! [`ProjectChangedListener`].

mod changes;
mod collaborators;
mod context;
mod engine;
mod error;
mod events;
mod listeners;
mod monitor;

pub use changes::has_dependency_change;
pub use collaborators::{
    IndexDocument, IndexScope, MarkerSink, NoopIndex, NoopMarkers, ProjectIndex,
};
pub use context::{RefreshContext, RefreshRequest};
pub use engine::{ProjectManager, RefreshSummary};
pub use error::{IndexError, ListenerError, RefreshError, Result};
pub use events::{ChangeEventAggregator, ChangeFlags, ChangeKind, ProjectChangedEvent};
pub use listeners::{ListenerSet, ProjectChangedListener};
pub use monitor::RefreshMonitor;
