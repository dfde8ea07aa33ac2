//! Resolver configuration and update flags.

/// Goals run to filter resources when none are configured.
pub const DEFAULT_FILTERING_GOALS: &str = "process-resources resources:testResources";

/// Goals run on a full build when none are configured.
pub const DEFAULT_FULL_BUILD_GOALS: &str = "process-test-resources";

/// Per-descriptor settings consumed by the resolver and by the registry.
///
/// The registry reads two switches: `resolve_workspace_projects` decides which
/// reverse-index partition a facade's edges land in, and `include_modules` decides
/// whether nested modules are tracked as full children.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolverConfiguration {
    pub resolve_workspace_projects: bool,
    pub include_modules: bool,
    pub resource_filtering_goals: String,
    pub full_build_goals: String,
    /// Comma separated profile ids.
    pub active_profiles: String,
}

impl Default for ResolverConfiguration {
    fn default() -> Self {
        Self {
            resolve_workspace_projects: true,
            include_modules: false,
            resource_filtering_goals: DEFAULT_FILTERING_GOALS.to_string(),
            full_build_goals: DEFAULT_FULL_BUILD_GOALS.to_string(),
            active_profiles: String::new(),
        }
    }
}

impl ResolverConfiguration {
    pub fn with_workspace_resolution(mut self, enabled: bool) -> Self {
        self.resolve_workspace_projects = enabled;
        self
    }

    pub fn with_include_modules(mut self, enabled: bool) -> Self {
        self.include_modules = enabled;
        self
    }

    pub fn with_active_profiles(mut self, profiles: impl Into<String>) -> Self {
        self.active_profiles = profiles.into();
        self
    }

    /// Active profiles split on commas, trimmed, empties dropped.
    pub fn active_profile_list(&self) -> Vec<&str> {
        self.active_profiles
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Network behaviour requested for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateFlags {
    pub offline: bool,
    pub update_snapshots: bool,
}

impl UpdateFlags {
    pub fn new(offline: bool, update_snapshots: bool) -> Self {
        Self {
            offline,
            update_snapshots,
        }
    }

    /// Offline, no snapshot updates. Used for ad hoc loads outside a batch.
    pub fn offline() -> Self {
        Self::new(true, false)
    }
}
