//! # Registry
//!
//! The in-memory graph of tracked modules: facades keyed by descriptor identity,
//! the reverse dependency index, the module index and the workspace-module shadow
//! index.
//!
//! [`WorkspaceState`] is the pure data structure; [`ProjectRegistry`] is the shared
//! instance readers use concurrently with a refresh batch.

mod dependency_index;
mod error;
mod shared;
mod state;

pub use dependency_index::{DependencyIndex, EdgeKind};
pub use error::ModuleCycle;
pub use shared::ProjectRegistry;
pub use state::WorkspaceState;

pub(crate) use dependency_index::FxIndexSet;
