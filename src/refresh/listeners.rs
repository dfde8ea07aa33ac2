//! Change listeners and their registration set.

use parking_lot::Mutex;
use std::sync::Arc;

use super::error::ListenerError;
use super::events::ProjectChangedEvent;
use super::monitor::RefreshMonitor;

/// Receives the merged events of each completed batch.
pub trait ProjectChangedListener: Send + Sync {
    fn projects_changed(
        &self,
        events: &[ProjectChangedEvent],
        monitor: &RefreshMonitor,
    ) -> Result<(), ListenerError>;
}

impl<F> ProjectChangedListener for F
where
    F: Fn(&[ProjectChangedEvent], &RefreshMonitor) -> Result<(), ListenerError> + Send + Sync,
{
    fn projects_changed(
        &self,
        events: &[ProjectChangedEvent],
        monitor: &RefreshMonitor,
    ) -> Result<(), ListenerError> {
        self(events, monitor)
    }
}

/// Registered listeners, in registration order, compared by identity.
///
/// Synchronized independently of the registry so registration never waits on
/// a batch.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<Arc<dyn ProjectChangedListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. Returns false if it was already registered.
    pub fn add(&self, listener: Arc<dyn ProjectChangedListener>) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister `listener`. Returns false if it was not registered.
    pub fn remove(&self, listener: &Arc<dyn ProjectChangedListener>) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    /// Listeners registered right now; later changes do not affect the copy.
    pub fn snapshot(&self) -> Vec<Arc<dyn ProjectChangedListener>> {
        self.listeners.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

fn same_listener(a: &Arc<dyn ProjectChangedListener>, b: &Arc<dyn ProjectChangedListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
