//! Mount runner - the single consumer of a surface's transaction stream
//!
//! The runner pulls ordered transactions from a coordinator and hands them
//! to the delegate that actually touches native views. All runner entry
//! points that mount must be called from the one thread permitted to do so;
//! the runner enforces ordering and telemetry, the delegate executes.

use std::sync::Arc;
use std::time::Duration;

use weft_mount::{MountTransaction, MountingCoordinator, TelemetryController};

use crate::beat::{BeatFactory, EventBeat, OwnerBox};

/// The thread-affine executor of view mutations.
///
/// Implementations wrap the native view layer; they receive transactions
/// strictly in revision order, with no gaps and no duplicates.
pub trait MountDelegate: Send + Sync {
    /// Apply one transaction's mutations to the native view hierarchy
    fn apply(&self, transaction: &MountTransaction);
}

/// Drives a delegate from a coordinator's ordered transaction stream
pub struct MountRunner {
    coordinator: Arc<MountingCoordinator>,
    delegate: Arc<dyn MountDelegate>,
    telemetry: TelemetryController,
}

impl MountRunner {
    /// Create a runner for a surface's coordinator
    pub fn new(coordinator: Arc<MountingCoordinator>, delegate: Arc<dyn MountDelegate>) -> Self {
        Self {
            coordinator,
            delegate,
            telemetry: TelemetryController::new(),
        }
    }

    /// The coordinator this runner consumes from
    pub fn coordinator(&self) -> &Arc<MountingCoordinator> {
        &self.coordinator
    }

    /// Telemetry for the transactions mounted so far
    pub fn telemetry(&self) -> &TelemetryController {
        &self.telemetry
    }

    /// Mount the next in-order transaction, if one is pullable
    pub fn mount_next(&self) -> bool {
        self.telemetry
            .pull_and_mount(&self.coordinator, |transaction| {
                self.delegate.apply(transaction)
            })
    }

    /// Mount everything currently pullable; returns how many mounted
    pub fn drain(&self) -> usize {
        let mut mounted = 0;
        while self.mount_next() {
            mounted += 1;
        }
        mounted
    }

    /// Block up to `timeout` for a transaction, then mount it and whatever
    /// queued up behind it. Returns how many mounted; zero on timeout or
    /// teardown.
    pub fn run_for(&self, timeout: Duration) -> usize {
        let Some(mut transaction) = self.coordinator.wait_and_pull(timeout) else {
            return 0;
        };
        self.telemetry.mount(&mut transaction, |transaction| {
            self.delegate.apply(transaction)
        });
        1 + self.drain()
    }

    /// Wire a runner to a beat: pushes that become pullable request the
    /// beat, and each fired beat drains the backlog.
    ///
    /// The beat is built against an empty owner slot; the runner publishes
    /// itself once wiring is done, so a beat that fires during construction
    /// safely skips its callback.
    pub fn connect(runner: &Arc<MountRunner>, factory: &BeatFactory) -> Arc<dyn EventBeat> {
        let slot = OwnerBox::empty();

        let weak = Arc::downgrade(runner);
        let beat = factory(
            slot.clone(),
            Box::new(move |_context| {
                if let Some(runner) = weak.upgrade() {
                    runner.drain();
                }
            }),
        );
        slot.publish(runner);

        let wake = beat.clone();
        runner
            .coordinator
            .set_listener(move |_surface| wake.request());
        beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::{BeatCallback, SynchronousEventBeat};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use weft_core::{RevisionNumber, SurfaceId};
    use weft_mount::{CommitRequest, SurfaceState, TransactionTelemetry};

    struct RecordingDelegate {
        applied: Mutex<Vec<u64>>,
    }

    impl RecordingDelegate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                applied: Mutex::new(Vec::new()),
            })
        }
    }

    impl MountDelegate for RecordingDelegate {
        fn apply(&self, transaction: &MountTransaction) {
            self.applied.lock().push(transaction.number().get());
        }
    }

    fn transaction(number: u64) -> MountTransaction {
        MountTransaction::new(
            SurfaceId::new(1),
            RevisionNumber::new(number),
            Vec::new(),
            TransactionTelemetry::default(),
        )
    }

    #[test]
    fn test_drain_mounts_in_order() {
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));
        let delegate = RecordingDelegate::new();
        let runner = MountRunner::new(coordinator.clone(), delegate.clone());

        coordinator.push(transaction(2));
        coordinator.push(transaction(1));
        coordinator.push(transaction(3));

        assert_eq!(runner.drain(), 3);
        assert_eq!(*delegate.applied.lock(), vec![1, 2, 3]);
        assert_eq!(runner.telemetry().mounted_count(), 3);

        let snapshot = runner.telemetry().last_snapshot().unwrap();
        assert_eq!(snapshot.revision, 3);
    }

    #[test]
    fn test_run_for_blocks_until_commit() {
        let state = Arc::new(SurfaceState::new(SurfaceId::new(1)));
        let delegate = RecordingDelegate::new();
        let runner = MountRunner::new(state.coordinator().clone(), delegate.clone());

        let producer = {
            let state = state.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                state.commit(CommitRequest::new(Arc::new(())));
            })
        };

        assert_eq!(runner.run_for(Duration::from_secs(5)), 1);
        assert_eq!(*delegate.applied.lock(), vec![1]);
        producer.join().unwrap();
    }

    #[test]
    fn test_run_for_times_out_empty() {
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));
        let runner = MountRunner::new(coordinator, RecordingDelegate::new());

        assert_eq!(runner.run_for(Duration::from_millis(10)), 0);
    }

    #[test]
    fn test_connected_beat_gates_mounting() {
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));
        let delegate = RecordingDelegate::new();
        let runner = Arc::new(MountRunner::new(coordinator.clone(), delegate.clone()));

        let factory: BeatFactory = Box::new(|slot, callback: BeatCallback| {
            Arc::new(SynchronousEventBeat::new(slot, callback))
        });
        let beat = MountRunner::connect(&runner, &factory);

        // The push requests the beat but nothing mounts until it fires.
        coordinator.push(transaction(1));
        assert!(delegate.applied.lock().is_empty());

        beat.induce();
        assert_eq!(*delegate.applied.lock(), vec![1]);

        // No pending request: inducing again mounts nothing further.
        beat.induce();
        assert_eq!(*delegate.applied.lock(), vec![1]);
    }

    #[test]
    fn test_two_producers_one_consumer_full_ordering() {
        let _ = env_logger::builder().is_test(true).try_init();
        let state = Arc::new(SurfaceState::new(SurfaceId::new(1)));
        let delegate = RecordingDelegate::new();
        let runner = MountRunner::new(state.coordinator().clone(), delegate.clone());

        let producers: Vec<_> = (0..2)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        state.commit(CommitRequest::new(Arc::new(())));
                    }
                })
            })
            .collect();

        let mut mounted = 0;
        while mounted < 100 {
            mounted += runner.run_for(Duration::from_secs(5));
        }
        for producer in producers {
            producer.join().unwrap();
        }

        let applied = delegate.applied.lock();
        assert_eq!(*applied, (1..=100).collect::<Vec<u64>>());
    }
}
