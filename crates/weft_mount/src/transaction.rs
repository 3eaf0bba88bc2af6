//! Mount transactions - ordered mutation batches moving between revisions
//!
//! A transaction carries everything needed to move the mounted hierarchy
//! from revision N-1 to revision N. It is created by the diff stage, pushed
//! into a [`TransactionQueue`](crate::TransactionQueue), and consumed exactly
//! once by the mount thread; it is never mutated after creation apart from
//! the mount-phase telemetry marks stamped by its final owner.

use weft_core::{RevisionNumber, SurfaceId};

use crate::mutation::ViewMutation;
use crate::telemetry::TransactionTelemetry;

/// The mutations and telemetry for one revision step of a surface
#[derive(Debug)]
pub struct MountTransaction {
    surface: SurfaceId,
    number: RevisionNumber,
    mutations: Vec<ViewMutation>,
    telemetry: TransactionTelemetry,
}

impl MountTransaction {
    /// Create a new transaction
    pub fn new(
        surface: SurfaceId,
        number: RevisionNumber,
        mutations: Vec<ViewMutation>,
        telemetry: TransactionTelemetry,
    ) -> Self {
        Self {
            surface,
            number,
            mutations,
            telemetry,
        }
    }

    /// The surface this transaction targets
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The revision number this transaction mounts
    pub fn number(&self) -> RevisionNumber {
        self.number
    }

    /// The ordered mutation records
    pub fn mutations(&self) -> &[ViewMutation] {
        &self.mutations
    }

    /// Number of mutations in the batch
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the batch carries no mutations
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// The telemetry record accumulated so far
    pub fn telemetry(&self) -> &TransactionTelemetry {
        &self.telemetry
    }

    /// Mutable telemetry access for the mount consumer's phase marks
    pub fn telemetry_mut(&mut self) -> &mut TransactionTelemetry {
        &mut self.telemetry
    }
}
