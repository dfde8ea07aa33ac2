//! Error types for refresh batches and their collaborators.

use thiserror::Error;

use crate::base::DescriptorId;
use crate::registry::ModuleCycle;

/// Outcome of a refresh batch that did not complete.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The batch was cancelled. Committed registry changes stay; no listener
    /// is notified for the batch.
    #[error("refresh interrupted")]
    Interrupted,

    /// A descriptor is reachable from itself through declared nested modules.
    #[error("module cycle through {0}")]
    ModuleCycle(DescriptorId),
}

impl From<ModuleCycle> for RefreshError {
    fn from(cycle: ModuleCycle) -> Self {
        Self::ModuleCycle(cycle.0)
    }
}

pub type Result<T> = std::result::Result<T, RefreshError>;

/// Failure reported by the project index collaborator.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Index rejected the document.
    #[error("index rejected {descriptor}: {message}")]
    Rejected {
        descriptor: DescriptorId,
        message: String,
    },
}

impl IndexError {
    pub fn rejected(descriptor: DescriptorId, message: impl Into<String>) -> Self {
        Self::Rejected {
            descriptor,
            message: message.into(),
        }
    }
}

/// Failure returned by a change listener.
#[derive(Debug, Error)]
#[error("listener failed: {message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
