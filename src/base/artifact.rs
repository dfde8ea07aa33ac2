//! Artifact identity.

use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a publishable module or of a dependency.
///
/// Two keys are equal iff all defined fields match. An absent classifier is
/// distinct from an empty one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArtifactKey {
    group: SmolStr,
    artifact: SmolStr,
    version: SmolStr,
    classifier: Option<SmolStr>,
}

impl ArtifactKey {
    /// Create a key without a classifier.
    pub fn new(
        group: impl Into<SmolStr>,
        artifact: impl Into<SmolStr>,
        version: impl Into<SmolStr>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
        }
    }

    /// Return the same key with `classifier` set.
    pub fn with_classifier(mut self, classifier: impl Into<SmolStr>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// Error returned when a `group:artifact:version[:classifier]` string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid artifact key '{input}': expected group:artifact:version[:classifier]")]
pub struct ParseArtifactKeyError {
    input: String,
}

impl FromStr for ArtifactKey {
    type Err = ParseArtifactKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseArtifactKeyError {
            input: s.to_string(),
        };
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => {
                Ok(ArtifactKey::new(*g, *a, *v))
            }
            [g, a, v, c] if !g.is_empty() && !a.is_empty() && !v.is_empty() => {
                Ok(ArtifactKey::new(*g, *a, *v).with_classifier(*c))
            }
            _ => Err(err()),
        }
    }
}
