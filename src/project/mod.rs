//! # Project
//!
//! Per-descriptor model: the immutable [`ProjectFacade`] built from a resolver's
//! [`ResolvedSnapshot`], the [`ResolverConfiguration`] it was computed with, and the
//! [`StalenessToken`] that decides when it must be recomputed.
//!
//! The two external collaborators the engine consults for every descriptor are
//! defined here as traits: [`DescriptorSource`] and [`DescriptorResolver`].

mod config;
mod facade;
mod resolver;
mod source;

pub use config::{
    DEFAULT_FILTERING_GOALS, DEFAULT_FULL_BUILD_GOALS, ResolverConfiguration, UpdateFlags,
};
pub use facade::{BuildPlugin, ParentRef, ProjectFacade, ResolvedDependency, ResolvedSnapshot};
pub use resolver::{DescriptorResolver, Diagnostic, ResolveFailure, Severity};
pub use source::{
    DescriptorSource, FileStamp, FsDescriptorSource, SourceOptions, StalenessToken,
};
