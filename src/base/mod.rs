//! Foundation types for the pomgraph registry.
//!
//! This module provides the identities used as keys everywhere else:
//! - [`DescriptorId`] - Workspace-relative handle to one module descriptor file
//! - [`ArtifactKey`] - group/artifact/version/classifier identity of a module or dependency
//! - Path constants (descriptor file name, metadata companions)
//!
//! This module has NO dependencies on other pomgraph modules.

pub mod constants;
mod artifact;
mod descriptor;

pub use artifact::{ArtifactKey, ParseArtifactKeyError};
pub use descriptor::DescriptorId;
