//! # weft_sched - Beats, Executors & the Mount Consumer
//!
//! Scheduling for the Weft mounting pipeline:
//! - Event beats that gate when queued work flushes into the logic runtime
//! - Work executors, including start-up buffering with strict FIFO ordering
//! - The mount runner that drives a delegate from a coordinator's stream
//!
//! ## Architecture
//!
//! ```text
//! Coordinator push ──► listener ──► beat.request()
//!                                       │
//!                        scheduling source fires beat
//!                                       ▼
//!                            MountRunner::drain() ──► MountDelegate
//! ```

pub mod beat;
pub mod buffered;
pub mod executor;
pub mod runner;

pub use beat::{
    AsynchronousEventBeat, BeatCallback, BeatCore, BeatFactory, EventBeat, FlushContext,
    OwnerBox, SynchronousEventBeat,
};
pub use buffered::BufferedExecutor;
pub use executor::{ExecutorError, InlineExecutor, ThreadExecutor, Work, WorkExecutor};
pub use runner::{MountDelegate, MountRunner};
