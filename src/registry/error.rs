use thiserror::Error;

use crate::base::DescriptorId;

/// A descriptor reachable from itself through declared nested modules.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("module cycle through {0}")]
pub struct ModuleCycle(pub DescriptorId);
