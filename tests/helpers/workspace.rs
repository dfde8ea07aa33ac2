//! In-memory workspace acting as both descriptor source and resolver.

use parking_lot::Mutex;
use pomgraph::base::{ArtifactKey, DescriptorId};
use pomgraph::project::{
    DescriptorResolver, DescriptorSource, Diagnostic, ResolveFailure, ResolvedSnapshot,
    ResolverConfiguration, StalenessToken, UpdateFlags,
};
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct Entry {
    outcome: Result<ResolvedSnapshot, Vec<Diagnostic>>,
    revision: u64,
    accessible: bool,
}

#[derive(Default)]
struct State {
    entries: FxHashMap<DescriptorId, Entry>,
    configurations: FxHashMap<DescriptorId, ResolverConfiguration>,
    calls: Vec<(DescriptorId, UpdateFlags)>,
    cancel_on: Option<DescriptorId>,
    revision: u64,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

/// Descriptors live in a map; each edit bumps a revision that feeds the
/// staleness token. Every resolver call is logged.
#[derive(Default)]
pub struct FakeWorkspace {
    state: Mutex<State>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the descriptor at `path`.
    pub fn put(&self, path: &str, snapshot: ResolvedSnapshot) -> DescriptorId {
        self.set(path, Ok(snapshot))
    }

    /// Make resolution of `path` fail with `diagnostics`.
    pub fn fail(&self, path: &str, diagnostics: Vec<Diagnostic>) -> DescriptorId {
        self.set(path, Err(diagnostics))
    }

    fn set(&self, path: &str, outcome: Result<ResolvedSnapshot, Vec<Diagnostic>>) -> DescriptorId {
        let id = DescriptorId::new(path);
        let mut state = self.state.lock();
        let revision = state.bump();
        state.entries.insert(
            id.clone(),
            Entry {
                outcome,
                revision,
                accessible: true,
            },
        );
        id
    }

    /// Make `path` inaccessible.
    pub fn delete(&self, path: &str) {
        let mut state = self.state.lock();
        let revision = state.bump();
        if let Some(entry) = state.entries.get_mut(&DescriptorId::new(path)) {
            entry.accessible = false;
            entry.revision = revision;
        }
    }

    /// Change the staleness token of `path` without changing its content.
    pub fn touch(&self, path: &str) {
        let mut state = self.state.lock();
        let revision = state.bump();
        if let Some(entry) = state.entries.get_mut(&DescriptorId::new(path)) {
            entry.revision = revision;
        }
    }

    pub fn configure(&self, path: &str, configuration: ResolverConfiguration) {
        self.state
            .lock()
            .configurations
            .insert(DescriptorId::new(path), configuration);
    }

    /// Cancel the batch's token when `path` is resolved.
    pub fn cancel_when_resolving(&self, path: Option<&str>) {
        self.state.lock().cancel_on = path.map(DescriptorId::new);
    }

    /// Descriptors handed to the resolver, in call order.
    pub fn calls(&self) -> Vec<DescriptorId> {
        self.state.lock().calls.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn calls_with_flags(&self) -> Vec<(DescriptorId, UpdateFlags)> {
        self.state.lock().calls.clone()
    }

    pub fn resolutions_of(&self, path: &str) -> usize {
        let id = DescriptorId::new(path);
        self.state.lock().calls.iter().filter(|(c, _)| *c == id).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

impl DescriptorSource for FakeWorkspace {
    fn is_accessible(&self, id: &DescriptorId) -> bool {
        self.state
            .lock()
            .entries
            .get(id)
            .is_some_and(|entry| entry.accessible)
    }

    fn staleness_token(&self, id: &DescriptorId) -> StalenessToken {
        let revision = self.state.lock().entries.get(id).map_or(0, |e| e.revision);
        StalenessToken::from_revision(revision)
    }

    fn resolver_configuration(&self, id: &DescriptorId) -> ResolverConfiguration {
        self.state
            .lock()
            .configurations
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

impl DescriptorResolver for FakeWorkspace {
    fn resolve(
        &self,
        id: &DescriptorId,
        _configuration: &ResolverConfiguration,
        flags: UpdateFlags,
        cancel: &CancellationToken,
    ) -> Result<ResolvedSnapshot, ResolveFailure> {
        let mut state = self.state.lock();
        state.calls.push((id.clone(), flags));
        if state.cancel_on.as_ref() == Some(id) {
            cancel.cancel();
        }
        match state.entries.get(id).map(|entry| entry.outcome.clone()) {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(diagnostics)) => Err(ResolveFailure::new(id.clone(), diagnostics)),
            None => Err(ResolveFailure::new(
                id.clone(),
                vec![Diagnostic::error(format!("no descriptor at {id}"))],
            )),
        }
    }
}

/// Descriptor missing its artifact, for diagnostics.
pub fn missing(key: ArtifactKey) -> Vec<Diagnostic> {
    vec![Diagnostic::missing(key)]
}
