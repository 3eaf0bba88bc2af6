//! Buffered executor - ordered start-up buffering over another executor
//!
//! During start-up the underlying executor may not be ready to run work in a
//! meaningful order, so submissions are parked. The backing store does not
//! itself guarantee FIFO order, so each item is stamped with a monotonic
//! index and drained through a min-heap. Buffering is strictly a one-time
//! phase: once flushed, the executor degrades to direct dispatch forever.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::executor::{Work, WorkExecutor};

struct IndexedWork {
    index: u64,
    work: Work,
}

impl PartialEq for IndexedWork {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for IndexedWork {}

impl PartialOrd for IndexedWork {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexedWork {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.index.cmp(&other.index)
    }
}

struct BufferState {
    next_index: u64,
    pending: BinaryHeap<Reverse<IndexedWork>>,
}

/// Preserves submission order through a start-up window, then dispatches
/// directly
pub struct BufferedExecutor {
    inner: Arc<dyn WorkExecutor>,
    buffering: AtomicBool,
    state: Mutex<BufferState>,
}

impl BufferedExecutor {
    /// Wrap an executor with buffering enabled
    pub fn new(inner: Arc<dyn WorkExecutor>) -> Self {
        Self {
            inner,
            buffering: AtomicBool::new(true),
            state: Mutex::new(BufferState {
                next_index: 0,
                pending: BinaryHeap::new(),
            }),
        }
    }

    /// Whether submissions are still being parked
    pub fn is_buffering(&self) -> bool {
        self.buffering.load(Ordering::Acquire)
    }

    /// Drain parked work in index order into the underlying executor, then
    /// disable buffering permanently.
    pub fn flush(&self) {
        let mut state = self.state.lock();
        let drained = state.pending.len();
        while let Some(Reverse(item)) = state.pending.pop() {
            self.inner.execute(item.work);
        }
        self.buffering.store(false, Ordering::Release);
        if drained > 0 {
            log::debug!("buffered executor flushed {drained} parked item(s)");
        }
    }
}

impl WorkExecutor for BufferedExecutor {
    fn execute(&self, work: Work) {
        // Unlocked fast path: the enabled -> disabled transition is
        // one-directional, so a stale read only means taking the slow path.
        if !self.buffering.load(Ordering::Acquire) {
            self.inner.execute(work);
            return;
        }

        let mut state = self.state.lock();
        if !self.buffering.load(Ordering::Acquire) {
            // Lost the race against flush(); dispatch directly.
            drop(state);
            self.inner.execute(work);
            return;
        }

        let index = state.next_index;
        state.next_index += 1;
        state.pending.push(Reverse(IndexedWork { index, work }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use parking_lot::Mutex;

    fn recording(order: &Arc<Mutex<Vec<u32>>>, value: u32) -> Work {
        let order = order.clone();
        Box::new(move || order.lock().push(value))
    }

    #[test]
    fn test_buffered_work_is_parked_until_flush() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let executor = BufferedExecutor::new(Arc::new(InlineExecutor));

        executor.execute(recording(&order, 1));
        executor.execute(recording(&order, 2));
        assert!(order.lock().is_empty());
        assert!(executor.is_buffering());

        executor.flush();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn test_flush_preserves_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let executor = BufferedExecutor::new(Arc::new(InlineExecutor));

        for value in [1, 2, 3] {
            executor.execute(recording(&order, value));
        }
        executor.flush();
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_buffering_never_reenables() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let executor = BufferedExecutor::new(Arc::new(InlineExecutor));

        executor.flush();
        assert!(!executor.is_buffering());

        // Past the window, work dispatches directly.
        executor.execute(recording(&order, 7));
        assert_eq!(*order.lock(), vec![7]);

        executor.flush();
        assert!(!executor.is_buffering());
    }

    #[test]
    fn test_cross_thread_submissions_keep_index_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let executor = Arc::new(BufferedExecutor::new(Arc::new(InlineExecutor)));

        let handles: Vec<_> = (0..4u32)
            .map(|thread| {
                let executor = executor.clone();
                let order = order.clone();
                std::thread::spawn(move || {
                    for step in 0..25u32 {
                        let order = order.clone();
                        let value = thread * 100 + step;
                        executor.execute(Box::new(move || order.lock().push(value)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        executor.flush();

        // Index order is submission order: each thread's items must appear
        // in its own program order.
        let order = order.lock();
        assert_eq!(order.len(), 100);
        for thread in 0..4u32 {
            let per_thread: Vec<_> = order.iter().filter(|v| **v / 100 == thread).collect();
            assert!(per_thread.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
