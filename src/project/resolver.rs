//! Resolver collaborator contract.
//!
//! The resolver parses one descriptor and computes its dependency closure. Its
//! internals live outside this crate; the engine only sees this trait.

use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::base::{ArtifactKey, DescriptorId};

use super::config::{ResolverConfiguration, UpdateFlags};
use super::facade::ResolvedSnapshot;

/// Computes the snapshot of one descriptor.
///
/// Implementations must not mutate global state beyond a transient working
/// directory, and should return promptly once `cancel` is signalled.
pub trait DescriptorResolver: Send + Sync {
    fn resolve(
        &self,
        id: &DescriptorId,
        configuration: &ResolverConfiguration,
        flags: UpdateFlags,
        cancel: &CancellationToken,
    ) -> Result<ResolvedSnapshot, ResolveFailure>;
}

/// Severity level of a resolver diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A resolver message, optionally naming the artifact that could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub missing_artifact: Option<ArtifactKey>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            missing_artifact: None,
        }
    }

    /// Error for an artifact the resolver could not find.
    pub fn missing(key: ArtifactKey) -> Self {
        Self {
            severity: Severity::Error,
            message: format!("missing artifact {key}"),
            missing_artifact: Some(key),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.severity, self.message)
    }
}

/// Resolution of a descriptor failed.
#[derive(Clone, Debug, Error)]
#[error("failed to resolve {descriptor} ({} diagnostic(s))", diagnostics.len())]
pub struct ResolveFailure {
    pub descriptor: DescriptorId,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveFailure {
    pub fn new(descriptor: DescriptorId, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            descriptor,
            diagnostics,
        }
    }

    /// Artifacts the diagnostics report as missing, in diagnostic order.
    pub fn missing_artifacts(&self) -> impl Iterator<Item = &ArtifactKey> {
        self.diagnostics
            .iter()
            .filter_map(|d| d.missing_artifact.as_ref())
    }
}
