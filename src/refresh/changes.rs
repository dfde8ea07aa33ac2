//! Dependency-change detection between two versions of a facade.

use std::sync::Arc;

use crate::project::ProjectFacade;

/// Whether replacing `old` with `new` can change what dependents resolve.
///
/// Dependencies are compared positionally: reordering an otherwise identical
/// list counts as a change.
pub fn has_dependency_change(
    old: Option<&Arc<ProjectFacade>>,
    new: Option<&Arc<ProjectFacade>>,
) -> bool {
    let (old, new) = match (old, new) {
        (None, None) => return false,
        (Some(old), Some(new)) if Arc::ptr_eq(old, new) => return false,
        (Some(old), Some(new)) => (old, new),
        _ => return true,
    };

    if old.artifact_key() != new.artifact_key() {
        return true;
    }

    match (old.parent(), new.parent()) {
        (None, None) => {}
        (Some(a), Some(b)) => {
            if a.key != b.key || a.file != b.file {
                return true;
            }
        }
        _ => return true,
    }

    let (a, b) = (old.dependencies(), new.dependencies());
    if a.len() != b.len() {
        return true;
    }
    a.iter()
        .zip(b)
        .any(|(x, y)| x.key != y.key || x.file != y.file || x.optional != y.optional)
}
