//! Refresh requests and the per-batch worklist.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::trace;

use crate::base::DescriptorId;
use crate::project::UpdateFlags;
use crate::registry::FxIndexSet;

// ============================================================================
// REQUEST
// ============================================================================

/// One caller-supplied unit of work: descriptors to refresh, which of them
/// bypass the staleness check, and the update flags for the resolver.
#[derive(Clone, Debug, Default)]
pub struct RefreshRequest {
    ids: FxIndexSet<DescriptorId>,
    forced: FxIndexSet<DescriptorId>,
    flags: UpdateFlags,
}

impl RefreshRequest {
    pub fn new(ids: impl IntoIterator<Item = DescriptorId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Force every initial descriptor.
    pub fn force_all(mut self) -> Self {
        self.forced.extend(self.ids.iter().cloned());
        self
    }

    /// Force `ids`. Forced descriptors not among the initial ones are queued too.
    pub fn forcing(mut self, ids: impl IntoIterator<Item = DescriptorId>) -> Self {
        self.forced.extend(ids);
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.flags.offline = offline;
        self
    }

    pub fn with_update_snapshots(mut self, update_snapshots: bool) -> Self {
        self.flags.update_snapshots = update_snapshots;
        self
    }

    pub fn ids(&self) -> impl Iterator<Item = &DescriptorId> {
        self.ids.iter()
    }

    pub fn forced(&self) -> impl Iterator<Item = &DescriptorId> {
        self.forced.iter()
    }

    pub fn flags(&self) -> UpdateFlags {
        self.flags
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Worklist for the request being drained, plus the descriptors already
/// processed anywhere in the batch.
///
/// A descriptor is processed once it has been recomputed or removed; from then
/// on it is never queued again in the same batch, although `force` still
/// records it as forced. A descriptor popped and skipped as up to date is not
/// processed and may be queued again.
#[derive(Debug)]
pub struct RefreshContext {
    queue: VecDeque<DescriptorId>,
    queued: FxHashSet<DescriptorId>,
    forced: FxHashSet<DescriptorId>,
    processed: FxHashSet<DescriptorId>,
    flags: UpdateFlags,
}

impl RefreshContext {
    pub fn new(request: &RefreshRequest) -> Self {
        let mut context = Self {
            queue: VecDeque::new(),
            queued: FxHashSet::default(),
            forced: FxHashSet::default(),
            processed: FxHashSet::default(),
            flags: request.flags(),
        };
        context.load(request);
        context
    }

    /// Switch to the next request of the same batch.
    pub fn next_request(&mut self, request: &RefreshRequest) {
        self.queue.clear();
        self.queued.clear();
        self.forced.clear();
        self.flags = request.flags();
        self.load(request);
    }

    fn load(&mut self, request: &RefreshRequest) {
        self.enqueue(request.ids().cloned());
        self.force(request.forced().cloned());
    }

    pub fn pop(&mut self) -> Option<DescriptorId> {
        let id = self.queue.pop_front()?;
        self.queued.remove(&id);
        Some(id)
    }

    /// Record that `id` was recomputed or removed in this batch.
    pub fn mark_processed(&mut self, id: &DescriptorId) {
        self.processed.insert(id.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queue `ids` without forcing them. Idempotent.
    pub fn enqueue(&mut self, ids: impl IntoIterator<Item = DescriptorId>) {
        for id in ids {
            self.push(id);
        }
    }

    /// Queue `ids` and mark them forced. Idempotent.
    pub fn force(&mut self, ids: impl IntoIterator<Item = DescriptorId>) {
        for id in ids {
            self.forced.insert(id.clone());
            self.push(id);
        }
    }

    fn push(&mut self, id: DescriptorId) {
        if self.processed.contains(&id) {
            trace!(descriptor = %id, "already processed in this batch");
            return;
        }
        if self.queued.insert(id.clone()) {
            self.queue.push_back(id);
        }
    }

    pub fn is_forced(&self, id: &DescriptorId) -> bool {
        self.forced.contains(id)
    }

    pub fn is_processed(&self, id: &DescriptorId) -> bool {
        self.processed.contains(id)
    }

    pub fn flags(&self) -> UpdateFlags {
        self.flags
    }

    pub fn offline(&self) -> bool {
        self.flags.offline
    }

    pub fn update_snapshots(&self) -> bool {
        self.flags.update_snapshots
    }
}
