//! Per-batch change events and their aggregation.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::ops::{BitOr, BitOrAssign};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace};

use crate::base::DescriptorId;
use crate::project::ProjectFacade;

use super::listeners::ProjectChangedListener;
use super::monitor::RefreshMonitor;

/// What happened to a descriptor during a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// Bitset qualifying a change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChangeFlags(u8);

impl ChangeFlags {
    pub const NONE: Self = Self(0);
    pub const DEPENDENCIES: Self = Self(1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ChangeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChangeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One descriptor's net change over a batch.
#[derive(Clone, Debug)]
pub struct ProjectChangedEvent {
    id: DescriptorId,
    kind: ChangeKind,
    flags: ChangeFlags,
    old: Option<Arc<ProjectFacade>>,
    new: Option<Arc<ProjectFacade>>,
}

impl ProjectChangedEvent {
    pub fn new(
        id: DescriptorId,
        kind: ChangeKind,
        flags: ChangeFlags,
        old: Option<Arc<ProjectFacade>>,
        new: Option<Arc<ProjectFacade>>,
    ) -> Self {
        Self {
            id,
            kind,
            flags,
            old,
            new,
        }
    }

    pub fn id(&self) -> &DescriptorId {
        &self.id
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn flags(&self) -> ChangeFlags {
        self.flags
    }

    pub fn dependencies_changed(&self) -> bool {
        self.flags.contains(ChangeFlags::DEPENDENCIES)
    }

    /// Facade before the batch touched this descriptor.
    pub fn old_facade(&self) -> Option<&Arc<ProjectFacade>> {
        self.old.as_ref()
    }

    /// Facade after the last change in the batch.
    pub fn new_facade(&self) -> Option<&Arc<ProjectFacade>> {
        self.new.as_ref()
    }

    fn merge(&mut self, incoming: Self) {
        if self.old.is_none() {
            self.old = incoming.old;
        }
        self.new = incoming.new;
        self.flags |= incoming.flags;
        self.kind = incoming.kind;
    }
}

/// Accumulates at most one event per descriptor until the batch ends.
#[derive(Debug, Default)]
pub struct ChangeEventAggregator {
    events: IndexMap<DescriptorId, ProjectChangedEvent, FxBuildHasher>,
}

impl ChangeEventAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event for `id`, merging into an earlier one: the earliest `old`
    /// is kept, the latest `new` and `kind` win, flags are OR-ed.
    pub fn record(
        &mut self,
        id: &DescriptorId,
        kind: ChangeKind,
        flags: ChangeFlags,
        old: Option<Arc<ProjectFacade>>,
        new: Option<Arc<ProjectFacade>>,
    ) {
        trace!(descriptor = %id, ?kind, flags = flags.bits(), "record change");
        let incoming = ProjectChangedEvent::new(id.clone(), kind, flags, old, new);
        match self.events.get_mut(id) {
            Some(existing) => existing.merge(incoming),
            None => {
                self.events.insert(id.clone(), incoming);
            }
        }
    }

    pub fn get(&self, id: &DescriptorId) -> Option<&ProjectChangedEvent> {
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every pending event without notifying anyone.
    pub fn discard(&mut self) {
        self.events.clear();
    }

    /// Deliver all pending events, in recording order, to each listener in
    /// registration order, then clear. Nothing is delivered when empty.
    ///
    /// A listener that fails or panics is logged and skipped.
    pub fn flush(
        &mut self,
        listeners: &[Arc<dyn ProjectChangedListener>],
        monitor: &RefreshMonitor,
    ) -> Vec<ProjectChangedEvent> {
        if self.events.is_empty() {
            return Vec::new();
        }
        let events: Vec<ProjectChangedEvent> = self.events.drain(..).map(|(_, e)| e).collect();
        for listener in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.projects_changed(&events, monitor)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "project change listener failed"),
                Err(_) => error!("project change listener panicked"),
            }
        }
        events
    }
}
