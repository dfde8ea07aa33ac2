//! Descriptor identity and module path resolution.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::constants::{DESCRIPTOR_EXTENSION, DESCRIPTOR_FILE_NAME};

/// Stable handle to one module descriptor file, usually a workspace-relative path.
///
/// Paths are normalised lexically on construction (`.` dropped, `..` folded), so
/// `a/./b/../pom.xml` and `a/pom.xml` are the same identity. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(Arc<Path>);

impl DescriptorId {
    /// Create an identity from a path.
    ///
    /// Paths that cannot be normalised (a `..` above the root) are kept verbatim.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let normalized = normalize(path).unwrap_or_else(|| path.to_path_buf());
        Self(Arc::from(normalized.as_path()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory containing the descriptor (empty for a descriptor at the workspace root).
    pub fn directory(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Descriptor implied by a declared module name.
    ///
    /// `core` resolves to `<dir>/core/pom.xml`; `tools/build.xml` resolves to
    /// `<dir>/tools/build.xml`. Returns `None` for empty names and for names that
    /// climb above the workspace root.
    pub fn module(&self, name: &str) -> Option<DescriptorId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut target = self.directory().join(name);
        let is_descriptor = Path::new(name)
            .extension()
            .is_some_and(|ext| ext == DESCRIPTOR_EXTENSION);
        if !is_descriptor {
            target.push(DESCRIPTOR_FILE_NAME);
        }
        normalize(&target).map(|path| Self(Arc::from(path.as_path())))
    }

    /// Whether this descriptor lives strictly below `parent`'s directory.
    pub fn is_nested_under(&self, parent: &DescriptorId) -> bool {
        self != parent && self.directory().starts_with(parent.directory())
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorId({})", self.0.display())
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for DescriptorId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for DescriptorId {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for DescriptorId {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    Some(out)
}
