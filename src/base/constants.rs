//! Path constants shared by the descriptor source and module resolution.

/// File name of a module descriptor inside its module directory.
pub const DESCRIPTOR_FILE_NAME: &str = "pom.xml";

/// Extension that marks a declared module name as a descriptor file rather than a directory.
pub const DESCRIPTOR_EXTENSION: &str = "xml";

/// Metadata files, relative to the descriptor's directory, whose changes make a facade stale.
pub const METADATA_COMPANIONS: &[&str] = &[
    ".project",
    ".classpath",
    ".settings/org.maven.ide.eclipse.prefs",
];
