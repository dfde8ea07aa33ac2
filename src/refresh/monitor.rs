//! Progress and cancellation token for a refresh batch.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::base::DescriptorId;

/// Cancellation signal plus coarse progress for one batch.
///
/// Cloning the inner token through [`cancel_token`](Self::cancel_token) lets
/// another thread cancel the batch while it runs.
#[derive(Debug, Default)]
pub struct RefreshMonitor {
    cancel: CancellationToken,
    worked: AtomicUsize,
    sub_task: Mutex<Option<DescriptorId>>,
}

impl RefreshMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monitor driven by an existing token.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record the descriptor currently being processed.
    pub fn sub_task(&self, id: &DescriptorId) {
        *self.sub_task.lock() = Some(id.clone());
    }

    pub fn current_sub_task(&self) -> Option<DescriptorId> {
        self.sub_task.lock().clone()
    }

    pub fn worked(&self, units: usize) {
        self.worked.fetch_add(units, Ordering::Relaxed);
    }

    pub fn work_done(&self) -> usize {
        self.worked.load(Ordering::Relaxed)
    }

    pub(crate) fn done(&self) {
        self.sub_task.lock().take();
    }
}
