//! Work executors
//!
//! The executor seam lets the rest of the crate stay agnostic about where
//! work actually runs: inline on the calling thread, or on a dedicated
//! worker thread fed by a channel.

use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use thiserror::Error;

/// A unit of deferred work
pub type Work = Box<dyn FnOnce() + Send>;

/// Executor errors
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Something that can run work items
pub trait WorkExecutor: Send + Sync {
    /// Submit a work item for execution
    fn execute(&self, work: Work);
}

/// Runs work immediately on the calling thread
pub struct InlineExecutor;

impl WorkExecutor for InlineExecutor {
    fn execute(&self, work: Work) {
        work();
    }
}

/// A single named worker thread fed by an unbounded channel.
///
/// Work items run strictly in submission order. Dropping the executor closes
/// the channel, lets the worker drain what is already queued, and joins it.
pub struct ThreadExecutor {
    sender: Option<Sender<Work>>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadExecutor {
    /// Spawn the worker thread
    pub fn spawn(name: &str) -> Result<Self, ExecutorError> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Work>();
        let worker = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                while let Ok(work) = receiver.recv() {
                    work();
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

impl WorkExecutor for ThreadExecutor {
    fn execute(&self, work: Work) {
        let Some(sender) = &self.sender else {
            return;
        };
        if sender.send(work).is_err() {
            log::warn!("executor worker is gone, dropping work item");
        }
    }
}

impl Drop for ThreadExecutor {
    fn drop(&mut self) {
        // Closing the channel ends the worker's recv loop.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_executor_runs_immediately() {
        let ran = Arc::new(AtomicUsize::new(0));
        let observed = ran.clone();

        InlineExecutor.execute(Box::new(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_thread_executor_preserves_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let executor = ThreadExecutor::spawn("test-worker").unwrap();

        for index in 0..10 {
            let order = order.clone();
            executor.execute(Box::new(move || {
                order.lock().push(index);
            }));
        }

        // Drop joins the worker after it drains the queue.
        drop(executor);
        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    }
}
