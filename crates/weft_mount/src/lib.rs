//! # weft_mount - Revision Ordering & Commit/Mount Hand-off
//!
//! Commit threads produce immutable tree revisions; a single mount thread
//! applies their mutations to native views. This crate owns everything in
//! between: revision ordering, the cross-thread hand-off, and surface
//! lifetime.
//!
//! ## Architecture
//!
//! ```text
//! Commit A ──┐
//!            ├──► MountingCoordinator ──► TransactionQueue ──► Mount thread
//! Commit B ──┘          │                  (strict order,
//!                       ▼                   gap-free)
//!               SurfaceRegistry
//! ```
//!
//! ## Key Concepts
//!
//! - **Revision**: an immutable, numbered snapshot of a surface's tree
//! - **MountTransaction**: the mutations moving views from revision N-1 to N
//! - **TransactionQueue**: buffers out-of-order arrivals, releases in order
//! - **MountingCoordinator**: the one object both sides of the thread
//!   boundary touch
//! - **SurfaceRegistry**: thread-safe ownership of per-surface state

pub mod coordinator;
pub mod mutation;
pub mod queue;
pub mod registry;
pub mod revision;
pub mod telemetry;
pub mod transaction;

pub use coordinator::{MountingCoordinator, TransactionListener};
pub use mutation::ViewMutation;
pub use queue::TransactionQueue;
pub use registry::{CommitRequest, RegistryError, SurfaceRegistry, SurfaceState};
pub use revision::{Revision, RevisionSource, TreeSnapshot};
pub use telemetry::{TelemetryController, TelemetrySnapshot, TransactionTelemetry};
pub use transaction::MountTransaction;

// Re-export the identifier types alongside the values they identify.
pub use weft_core::{RevisionNumber, SurfaceId, ViewTag};
