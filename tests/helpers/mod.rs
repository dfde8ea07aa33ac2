//! Shared test helpers.

pub mod recorders;
pub mod workspace;
