//! Event beats - the cadence that gates queued work
//!
//! A beat decouples "work was requested" from "work is allowed to run": the
//! owner requests a flush, and the beat's scheduling source decides when the
//! callback actually fires. State machine: `idle -> requested -> (beat
//! fires) -> idle`. The requested flag is cleared before the callback runs,
//! so a faulting callback cannot wedge the beat.
//!
//! The beat cannot hold a strong reference to its owner: the owner is still
//! under construction when the beat is built. The [`OwnerBox`] models this as
//! two-phase construction - the beat is created against an empty slot and
//! the owner publishes itself right after its own construction completes.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::RwLock;

use crate::executor::WorkExecutor;

/// Execution-context handle passed to a beat callback
#[derive(Debug, Clone, Copy)]
pub struct FlushContext {
    induced: bool,
}

impl FlushContext {
    fn scheduled() -> Self {
        Self { induced: false }
    }

    fn induced() -> Self {
        Self { induced: true }
    }

    /// Whether the flush was forced via `induce()` rather than the beat's
    /// regular scheduling source
    pub fn is_induced(&self) -> bool {
        self.induced
    }
}

/// Callback invoked when a requested beat fires
pub type BeatCallback = Box<dyn Fn(&FlushContext) + Send + Sync>;

/// Two-phase owner slot for a beat.
///
/// Starts empty; the owner publishes itself after construction. The beat
/// checks liveness through the slot and skips its callback once the owner is
/// gone (or was never published).
pub struct OwnerBox {
    owner: RwLock<Weak<dyn Any + Send + Sync>>,
}

impl OwnerBox {
    /// Create a slot with no owner published yet
    pub fn empty() -> Arc<Self> {
        let empty: Weak<dyn Any + Send + Sync> = Weak::<()>::new();
        Arc::new(Self {
            owner: RwLock::new(empty),
        })
    }

    /// Publish the owner into the slot
    pub fn publish<T: Send + Sync + 'static>(&self, owner: &Arc<T>) {
        let owner: Arc<dyn Any + Send + Sync> = owner.clone();
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(&owner);
        *self.owner.write() = weak;
    }

    /// Whether the published owner is still alive
    pub fn is_alive(&self) -> bool {
        self.owner.read().strong_count() > 0
    }
}

/// Shared request/fire machinery for every beat variant
pub struct BeatCore {
    requested: AtomicBool,
    owner: Arc<OwnerBox>,
    callback: BeatCallback,
}

impl BeatCore {
    /// Bind the core to an owner slot and callback
    pub fn new(owner: Arc<OwnerBox>, callback: BeatCallback) -> Self {
        Self {
            requested: AtomicBool::new(false),
            owner,
            callback,
        }
    }

    /// Flag that a flush is desired; idempotent
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether a flush is currently desired
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Fire once if requested: clear the flag, check the owner, run the
    /// callback.
    pub fn tick(&self, context: FlushContext) {
        if !self.requested.swap(false, Ordering::AcqRel) {
            return;
        }
        if !self.owner.is_alive() {
            log::trace!("beat owner is gone, skipping flush");
            return;
        }
        (self.callback)(&context);
    }
}

/// A scheduling primitive that gates when queued work flushes
pub trait EventBeat: Send + Sync {
    /// Ask for a flush at the next beat; idempotent
    fn request(&self);

    /// Force a requested beat to fire now, subject to the variant's thread
    /// policy
    fn induce(&self);
}

/// Fires inline on a designated run-loop thread.
///
/// The run-loop observer calls [`beat`](Self::beat) when activity changes;
/// `induce()` fires immediately, but only when called from that same thread.
pub struct SynchronousEventBeat {
    core: BeatCore,
    run_loop: ThreadId,
}

impl SynchronousEventBeat {
    /// Create a beat bound to the calling thread's run loop
    pub fn new(owner: Arc<OwnerBox>, callback: BeatCallback) -> Self {
        Self::bound_to(owner, callback, thread::current().id())
    }

    /// Create a beat bound to an explicit run-loop thread
    pub fn bound_to(owner: Arc<OwnerBox>, callback: BeatCallback, run_loop: ThreadId) -> Self {
        Self {
            core: BeatCore::new(owner, callback),
            run_loop,
        }
    }

    /// Run-loop observer entry; fires the callback if a flush was requested
    pub fn beat(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.run_loop,
            "synchronous beat ticked off its run-loop thread"
        );
        self.core.tick(FlushContext::scheduled());
    }
}

impl EventBeat for SynchronousEventBeat {
    fn request(&self) {
        self.core.request();
    }

    fn induce(&self) {
        // Off the run-loop thread this is a no-op; the next scheduled beat
        // picks the request up instead.
        if thread::current().id() != self.run_loop {
            return;
        }
        self.core.tick(FlushContext::induced());
    }
}

/// Fires from a timer or external trigger on any thread.
///
/// `induce()` does not fire inline; it marshals the tick onto the beat's
/// executor so the callback always runs where the owner expects it.
pub struct AsynchronousEventBeat {
    core: Arc<BeatCore>,
    executor: Arc<dyn WorkExecutor>,
}

impl AsynchronousEventBeat {
    /// Create a beat that marshals induced ticks onto `executor`
    pub fn new(
        owner: Arc<OwnerBox>,
        callback: BeatCallback,
        executor: Arc<dyn WorkExecutor>,
    ) -> Self {
        Self {
            core: Arc::new(BeatCore::new(owner, callback)),
            executor,
        }
    }

    /// Scheduling-source entry (timer tick or external trigger); callable
    /// from any thread
    pub fn beat(&self) {
        self.core.tick(FlushContext::scheduled());
    }
}

impl EventBeat for AsynchronousEventBeat {
    fn request(&self) {
        self.core.request();
    }

    fn induce(&self) {
        if !self.core.is_requested() {
            return;
        }
        let core = self.core.clone();
        self.executor
            .execute(Box::new(move || core.tick(FlushContext::induced())));
    }
}

/// Factory contract handed to the logic-runtime integration layer: given an
/// owner slot, produce a beat bound to a callback.
pub type BeatFactory = Box<dyn Fn(Arc<OwnerBox>, BeatCallback) -> Arc<dyn EventBeat> + Send + Sync>;
