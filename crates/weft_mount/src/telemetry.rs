//! Transaction telemetry - begin/end marks for the pipeline phases
//!
//! Each transaction records diff, layout, commit and mount phase pairs
//! against a monotonic clock. Pairing is a programming contract: a `did_x`
//! must follow its unmatched `will_x`, and readers may only run once both
//! marks of a phase are in place. Violations are fatal in debug builds and
//! tolerated in release builds.
//!
//! Phase marks take `&mut self`: a telemetry record is owned by exactly one
//! stage at a time (producer, then queue, then mount consumer), so no lock
//! or atomic is needed for the marks themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::coordinator::MountingCoordinator;
use crate::transaction::MountTransaction;

/// One begin/end mark pair
#[derive(Debug, Clone, Copy, Default)]
struct Phase {
    start: Option<Instant>,
    end: Option<Instant>,
}

impl Phase {
    fn will(&mut self, name: &str) {
        debug_assert!(self.start.is_none(), "will_{name} called twice");
        if self.start.is_none() {
            self.start = Some(Instant::now());
        }
    }

    fn did(&mut self, name: &str) {
        debug_assert!(
            self.start.is_some() && self.end.is_none(),
            "did_{name} without a matching will_{name}"
        );
        if self.start.is_some() && self.end.is_none() {
            self.end = Some(Instant::now());
        }
    }

    fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    fn start_time(&self, name: &str) -> Instant {
        debug_assert!(self.is_complete(), "{name} start time read before did_{name}");
        self.start.unwrap_or_else(Instant::now)
    }

    fn end_time(&self, name: &str) -> Instant {
        debug_assert!(self.is_complete(), "{name} end time read before did_{name}");
        self.end.unwrap_or_else(Instant::now)
    }

    fn duration(&self, name: &str) -> Duration {
        debug_assert!(self.is_complete(), "{name} duration read before did_{name}");
        self.duration_or_zero()
    }

    // Tolerant reader for snapshots; unstamped phases report zero.
    fn duration_or_zero(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end - start,
            _ => Duration::ZERO,
        }
    }
}

/// Phase timings accumulated by a transaction as it moves through the pipeline
#[derive(Debug, Clone, Default)]
pub struct TransactionTelemetry {
    diff: Phase,
    layout: Phase,
    commit: Phase,
    mount: Phase,
}

impl TransactionTelemetry {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of the diff phase
    pub fn will_diff(&mut self) {
        self.diff.will("diff");
    }

    /// Mark the end of the diff phase
    pub fn did_diff(&mut self) {
        self.diff.did("diff");
    }

    /// Mark the start of the layout phase
    pub fn will_layout(&mut self) {
        self.layout.will("layout");
    }

    /// Mark the end of the layout phase
    pub fn did_layout(&mut self) {
        self.layout.did("layout");
    }

    /// Mark the start of the commit phase
    pub fn will_commit(&mut self) {
        self.commit.will("commit");
    }

    /// Mark the end of the commit phase
    pub fn did_commit(&mut self) {
        self.commit.did("commit");
    }

    /// Mark the start of the mount phase
    pub fn will_mount(&mut self) {
        self.mount.will("mount");
    }

    /// Mark the end of the mount phase
    pub fn did_mount(&mut self) {
        self.mount.did("mount");
    }

    /// Start of the diff phase; only valid once the phase completed
    pub fn diff_start_time(&self) -> Instant {
        self.diff.start_time("diff")
    }

    /// End of the diff phase; only valid once the phase completed
    pub fn diff_end_time(&self) -> Instant {
        self.diff.end_time("diff")
    }

    /// Duration of the diff phase
    pub fn diff_duration(&self) -> Duration {
        self.diff.duration("diff")
    }

    /// Start of the layout phase; only valid once the phase completed
    pub fn layout_start_time(&self) -> Instant {
        self.layout.start_time("layout")
    }

    /// End of the layout phase; only valid once the phase completed
    pub fn layout_end_time(&self) -> Instant {
        self.layout.end_time("layout")
    }

    /// Duration of the layout phase
    pub fn layout_duration(&self) -> Duration {
        self.layout.duration("layout")
    }

    /// Start of the commit phase; only valid once the phase completed
    pub fn commit_start_time(&self) -> Instant {
        self.commit.start_time("commit")
    }

    /// End of the commit phase; only valid once the phase completed
    pub fn commit_end_time(&self) -> Instant {
        self.commit.end_time("commit")
    }

    /// Duration of the commit phase
    pub fn commit_duration(&self) -> Duration {
        self.commit.duration("commit")
    }

    /// Start of the mount phase; only valid once the phase completed
    pub fn mount_start_time(&self) -> Instant {
        self.mount.start_time("mount")
    }

    /// End of the mount phase; only valid once the phase completed
    pub fn mount_end_time(&self) -> Instant {
        self.mount.end_time("mount")
    }

    /// Duration of the mount phase
    pub fn mount_duration(&self) -> Duration {
        self.mount.duration("mount")
    }
}

/// A finished transaction's timings, exportable to instrumentation pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Raw surface ID
    pub surface: u64,
    /// Raw revision number
    pub revision: u64,
    /// Diff phase duration (zero if the producer did not stamp it)
    pub diff: Duration,
    /// Layout phase duration (zero if the producer did not stamp it)
    pub layout: Duration,
    /// Commit phase duration
    pub commit: Duration,
    /// Mount phase duration
    pub mount: Duration,
    /// Number of mutations in the transaction
    pub mutations: usize,
}

impl TelemetrySnapshot {
    /// Capture a snapshot from a mounted transaction
    pub fn capture(transaction: &MountTransaction) -> Self {
        let telemetry = transaction.telemetry();
        Self {
            surface: transaction.surface().raw(),
            revision: transaction.number().get(),
            diff: telemetry.diff.duration_or_zero(),
            layout: telemetry.layout.duration_or_zero(),
            commit: telemetry.commit.duration_or_zero(),
            mount: telemetry.mount.duration_or_zero(),
            mutations: transaction.len(),
        }
    }
}

/// Retains the most recent mount telemetry for a surface's consumer.
///
/// The controller wraps the pull-and-apply step of the mount thread: it
/// stamps the mount phase marks around the supplied closure and keeps the
/// finished snapshot for instrumentation readers on other threads.
#[derive(Debug, Default)]
pub struct TelemetryController {
    last: Mutex<Option<TelemetrySnapshot>>,
    mounted: AtomicU64,
}

impl TelemetryController {
    /// Create a new controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount an already-pulled transaction through `apply`, stamping the
    /// mount phase marks and retaining the finished snapshot.
    pub fn mount<F>(&self, transaction: &mut MountTransaction, apply: F)
    where
        F: FnOnce(&MountTransaction),
    {
        transaction.telemetry_mut().will_mount();
        apply(transaction);
        transaction.telemetry_mut().did_mount();

        *self.last.lock() = Some(TelemetrySnapshot::capture(transaction));
        self.mounted.fetch_add(1, Ordering::Relaxed);
    }

    /// Pull the next in-order transaction and mount it through `apply`.
    ///
    /// Returns `false` when nothing was pullable. `apply` runs on the calling
    /// thread, which must be the surface's single mount consumer.
    pub fn pull_and_mount<F>(&self, coordinator: &MountingCoordinator, apply: F) -> bool
    where
        F: FnOnce(&MountTransaction),
    {
        let Some(mut transaction) = coordinator.pull() else {
            return false;
        };
        self.mount(&mut transaction, apply);
        true
    }

    /// The snapshot of the most recently mounted transaction, if any
    pub fn last_snapshot(&self) -> Option<TelemetrySnapshot> {
        self.last.lock().clone()
    }

    /// Total number of transactions mounted through this controller
    pub fn mounted_count(&self) -> u64 {
        self.mounted.load(Ordering::Relaxed)
    }
}
