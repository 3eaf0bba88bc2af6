//! Mounting coordinator - the commit/mount thread boundary
//!
//! The coordinator is the one object both commit threads and the mount
//! thread touch for a given surface. Producers push from any thread; the
//! single mount consumer pulls, optionally blocking until work arrives.
//! Teardown retires the coordinator: later pushes still succeed against the
//! orphaned queue, later pulls return nothing, permanently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use weft_core::SurfaceId;

use crate::queue::TransactionQueue;
use crate::transaction::MountTransaction;

/// Callback invoked when a push makes a transaction pullable
pub type TransactionListener = Box<dyn Fn(SurfaceId) + Send + Sync>;

/// Per-surface hand-off point between commit threads and the mount thread
pub struct MountingCoordinator {
    surface: SurfaceId,
    queue: Mutex<TransactionQueue>,
    available: Condvar,
    listener: RwLock<Option<TransactionListener>>,
    retired: AtomicBool,
}

impl MountingCoordinator {
    /// Create a coordinator for a surface
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            queue: Mutex::new(TransactionQueue::new(surface)),
            available: Condvar::new(),
            listener: RwLock::new(None),
            retired: AtomicBool::new(false),
        }
    }

    /// The surface this coordinator serves
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Buffer a transaction from any commit thread.
    ///
    /// Wakes a blocked consumer and fires the registered listener when the
    /// push makes a transaction pullable. The listener runs on the pushing
    /// thread, outside the queue lock.
    pub fn push(&self, transaction: MountTransaction) {
        let pullable = {
            let mut queue = self.queue.lock();
            queue.push(transaction);
            let pullable = queue.has_next();
            if pullable {
                self.available.notify_one();
            }
            pullable
        };

        if self.retired.load(Ordering::Acquire) {
            // Lost race against teardown; the transaction stays buffered in
            // the orphaned queue and is released with the coordinator.
            log::trace!("{}: push after teardown, transaction will never mount", self.surface);
            return;
        }

        if pullable {
            if let Some(listener) = self.listener.read().as_ref() {
                listener(self.surface);
            }
        }
    }

    /// Return the next in-order transaction without blocking
    pub fn pull(&self) -> Option<MountTransaction> {
        if self.retired.load(Ordering::Acquire) {
            return None;
        }
        self.queue.lock().pull()
    }

    /// Block the mount thread until a transaction is pullable or `timeout`
    /// elapses.
    ///
    /// A timeout is a normal empty result, not an error. Must only be called
    /// from the surface's single mount consumer.
    pub fn wait_and_pull(&self, timeout: Duration) -> Option<MountTransaction> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.queue.lock();
        loop {
            if self.retired.load(Ordering::Acquire) {
                return None;
            }
            if let Some(transaction) = queue.pull() {
                return Some(transaction);
            }
            if self.available.wait_until(&mut queue, deadline).timed_out() {
                if self.retired.load(Ordering::Acquire) {
                    return None;
                }
                return queue.pull();
            }
        }
    }

    /// Whether a pull would currently succeed
    pub fn has_pending(&self) -> bool {
        if self.retired.load(Ordering::Acquire) {
            return false;
        }
        self.queue.lock().has_next()
    }

    /// Register the push-based wake-up callback
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn(SurfaceId) + Send + Sync + 'static,
    {
        *self.listener.write() = Some(Box::new(listener));
    }

    /// Remove the wake-up callback
    pub fn clear_listener(&self) {
        *self.listener.write() = None;
    }

    /// Tear the coordinator down.
    ///
    /// Wakes any blocked consumer; every pull from now on returns `None`.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
        // Pair the store with the queue lock so a consumer between its
        // retired check and its wait cannot miss the wake-up.
        drop(self.queue.lock());
        self.available.notify_all();
        log::debug!("{}: coordinator retired", self.surface);
    }

    /// Whether the coordinator has been torn down
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TransactionTelemetry;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use weft_core::RevisionNumber;

    fn transaction(number: u64) -> MountTransaction {
        MountTransaction::new(
            SurfaceId::new(1),
            RevisionNumber::new(number),
            Vec::new(),
            TransactionTelemetry::default(),
        )
    }

    #[test]
    fn test_push_then_pull() {
        let coordinator = MountingCoordinator::new(SurfaceId::new(1));
        assert!(!coordinator.has_pending());

        coordinator.push(transaction(1));
        assert!(coordinator.has_pending());
        assert_eq!(coordinator.pull().unwrap().number().get(), 1);
        assert!(coordinator.pull().is_none());
    }

    #[test]
    fn test_wait_and_pull_times_out() {
        let coordinator = MountingCoordinator::new(SurfaceId::new(1));
        let pulled = coordinator.wait_and_pull(Duration::from_millis(10));
        assert!(pulled.is_none());
    }

    #[test]
    fn test_wait_and_pull_wakes_on_push() {
        let _ = env_logger::builder().is_test(true).try_init();
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));

        let producer = {
            let coordinator = coordinator.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                coordinator.push(transaction(1));
            })
        };

        let pulled = coordinator.wait_and_pull(Duration::from_secs(5));
        assert_eq!(pulled.unwrap().number().get(), 1);
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_skips_out_of_order_arrival() {
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));

        // Revision 2 alone must not wake the consumer into a result.
        coordinator.push(transaction(2));
        assert!(coordinator.wait_and_pull(Duration::from_millis(10)).is_none());

        coordinator.push(transaction(1));
        assert_eq!(
            coordinator.wait_and_pull(Duration::from_millis(10)).unwrap().number().get(),
            1
        );
    }

    #[test]
    fn test_listener_fires_only_when_pullable() {
        let coordinator = MountingCoordinator::new(SurfaceId::new(1));
        let fired = Arc::new(AtomicUsize::new(0));

        let observed = fired.clone();
        coordinator.set_listener(move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        // Out of order: buffered, not pullable, no notification.
        coordinator.push(transaction(2));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Fills the gap: now pullable.
        coordinator.push(transaction(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retire_wakes_blocked_consumer() {
        let coordinator = Arc::new(MountingCoordinator::new(SurfaceId::new(1)));

        let teardown = {
            let coordinator = coordinator.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                coordinator.retire();
            })
        };

        let pulled = coordinator.wait_and_pull(Duration::from_secs(5));
        assert!(pulled.is_none());
        teardown.join().unwrap();
    }

    #[test]
    fn test_push_after_retire_succeeds_but_never_mounts() {
        let coordinator = MountingCoordinator::new(SurfaceId::new(1));
        coordinator.retire();

        coordinator.push(transaction(1));
        assert!(coordinator.pull().is_none());
        assert!(!coordinator.has_pending());
    }
}
