//! Surface registry - thread-safe ownership of per-surface state
//!
//! The registry maps surface IDs to their owned state (latest revision +
//! coordinator). Lookups from any thread share a read lock; add/remove take
//! the write lock. Per-surface locks are independent of the registry lock,
//! and the registry's exclusive lock is never taken while a per-surface lock
//! is held.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use weft_core::{RevisionNumber, SequenceGenerator, SurfaceId};

use crate::coordinator::MountingCoordinator;
use crate::mutation::ViewMutation;
use crate::revision::{Revision, RevisionSource, TreeSnapshot};
use crate::telemetry::TransactionTelemetry;
use crate::transaction::MountTransaction;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Surface already registered: {0}")]
    AlreadyRegistered(SurfaceId),
}

/// Everything a commit needs to become the surface's next revision
pub struct CommitRequest {
    tree: Arc<dyn TreeSnapshot>,
    mutations: Vec<ViewMutation>,
    telemetry: TransactionTelemetry,
    source: RevisionSource,
}

impl CommitRequest {
    /// Start a request around the new tree snapshot
    pub fn new(tree: Arc<dyn TreeSnapshot>) -> Self {
        Self {
            tree,
            mutations: Vec::new(),
            telemetry: TransactionTelemetry::default(),
            source: RevisionSource::Normal,
        }
    }

    /// Attach the mutation batch computed by the diff stage
    pub fn mutations(mut self, mutations: Vec<ViewMutation>) -> Self {
        self.mutations = mutations;
        self
    }

    /// Carry over telemetry stamped by earlier phases
    pub fn telemetry(mut self, telemetry: TransactionTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Tag the revision's origin
    pub fn source(mut self, source: RevisionSource) -> Self {
        self.source = source;
        self
    }
}

/// A surface's tree and coordinator, owned by the registry while live
pub struct SurfaceState {
    id: SurfaceId,
    coordinator: Arc<MountingCoordinator>,
    current: RwLock<Option<Arc<Revision>>>,
}

impl SurfaceState {
    /// Create state for a surface with no committed revision yet
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            coordinator: Arc::new(MountingCoordinator::new(id)),
            current: RwLock::new(None),
        }
    }

    /// The surface ID
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// The surface's commit/mount hand-off point
    pub fn coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }

    /// The most recently committed revision, if any
    pub fn current_revision(&self) -> Option<Arc<Revision>> {
        self.current.read().clone()
    }

    /// Commit a new revision and push its transaction to the coordinator.
    ///
    /// Producers racing on the same surface serialize on the per-surface
    /// lock, so each accepted commit advances the revision number by exactly
    /// one. Returns the number the commit was assigned.
    pub fn commit(&self, request: CommitRequest) -> RevisionNumber {
        let CommitRequest {
            tree,
            mutations,
            mut telemetry,
            source,
        } = request;

        telemetry.will_commit();
        let number = {
            let mut current = self.current.write();
            let number = current
                .as_ref()
                .map(|revision| revision.number())
                .unwrap_or(RevisionNumber::INITIAL)
                .next();
            *current = Some(Arc::new(Revision::new(self.id, number, tree, source)));
            number
        };
        telemetry.did_commit();

        log::trace!("{}: committed revision {number}", self.id);
        self.coordinator
            .push(MountTransaction::new(self.id, number, mutations, telemetry));
        number
    }

    /// Forget the committed history so the next commit restarts at revision 1.
    ///
    /// The queue observes the fresh revision 1 and discards whatever it was
    /// still buffering.
    pub fn reset(&self) {
        *self.current.write() = None;
        log::debug!("{}: surface state reset", self.id);
    }
}

/// Thread-safe map from surface ID to owned surface state
pub struct SurfaceRegistry {
    surfaces: RwLock<HashMap<SurfaceId, Arc<SurfaceState>>>,
    sequence: SequenceGenerator,
}

impl SurfaceRegistry {
    /// Create a registry with its own ID sequence
    pub fn new() -> Self {
        Self::with_sequence(SequenceGenerator::new())
    }

    /// Create a registry around an injected ID sequence
    pub fn with_sequence(sequence: SequenceGenerator) -> Self {
        Self {
            surfaces: RwLock::new(HashMap::new()),
            sequence,
        }
    }

    /// Allocate the next unused surface ID
    pub fn allocate_id(&self) -> SurfaceId {
        SurfaceId::new(self.sequence.next())
    }

    /// Register a surface. Fails if the ID is already present.
    pub fn add(&self, state: Arc<SurfaceState>) -> Result<(), RegistryError> {
        let mut surfaces = self.surfaces.write();
        match surfaces.entry(state.id()) {
            Entry::Occupied(_) => {
                log::warn!("{}: surface already registered", state.id());
                Err(RegistryError::AlreadyRegistered(state.id()))
            }
            Entry::Vacant(vacant) => {
                log::debug!("{}: surface registered", state.id());
                vacant.insert(state);
                Ok(())
            }
        }
    }

    /// Remove a surface, transferring ownership of its state to the caller.
    ///
    /// The coordinator is retired after the write lock is released, so a
    /// consumer blocked on it wakes without the registry held. The caller can
    /// inspect the returned state at leisure.
    pub fn remove(&self, id: SurfaceId) -> Option<Arc<SurfaceState>> {
        let state = self.surfaces.write().remove(&id)?;
        state.coordinator().retire();
        log::debug!("{id}: surface removed");
        Some(state)
    }

    /// Look up a surface and run `f` on it under the shared lock.
    ///
    /// Returns whether the surface was found. `f` executes while the read
    /// lock is held; keep it short.
    pub fn with_surface<F>(&self, id: SurfaceId, f: F) -> bool
    where
        F: FnOnce(&SurfaceState),
    {
        let surfaces = self.surfaces.read();
        match surfaces.get(&id) {
            Some(state) => {
                f(state);
                true
            }
            None => false,
        }
    }

    /// Visit every live surface under the shared lock
    pub fn enumerate<F>(&self, mut f: F)
    where
        F: FnMut(&SurfaceState),
    {
        for state in self.surfaces.read().values() {
            f(state);
        }
    }

    /// Whether the surface is currently registered
    pub fn contains(&self, id: SurfaceId) -> bool {
        self.surfaces.read().contains_key(&id)
    }

    /// Number of live surfaces
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    /// Whether no surfaces are registered
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
