// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic execution engine.
//!
//! A [`PeriodicTask`] owns one OS thread that calls a closure at a fixed
//! rate. The periodic publisher drives its delivery loop with it; the
//! backend is picked by name (`thread_type`) from the runtime's task
//! registry, so alternative schedulers only need to implement
//! [`PeriodicTaskBase`].
//!
//! ```text
//!           activate()           suspend()
//!   Idle ─────────────▶ Running ◀──────────▶ Suspended
//!                          │        resume()     │ signal(): one iteration
//!                          └────── finalize() ───┴──────▶ Finalized
//! ```

mod periodic;
mod stats;

pub use periodic::PeriodicTask;
pub use stats::{Statistics, TimeMeasure};

use crate::error::Result;
use std::time::Duration;

/// Callable run once per period.
pub type TaskFn = Box<dyn FnMut() + Send + 'static>;

/// Lifecycle of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, thread not started.
    Idle,
    Running,
    /// Thread parked until `resume()` or `signal()`.
    Suspended,
    /// Thread stopped for good.
    Finalized,
}

/// Scheduler interface used by publishers.
pub trait PeriodicTaskBase: Send + Sync {
    /// Start the thread. Later calls are no-ops.
    ///
    /// # Errors
    /// [`crate::Error::ThreadSpawn`] when the OS refuses a new thread.
    fn activate(&self) -> Result<()>;

    /// Stop and join the thread. Irreversible.
    fn finalize(&self);

    /// Park the loop after the current iteration.
    fn suspend(&self);

    /// Leave the suspended state.
    fn resume(&self);

    /// Run exactly one iteration while suspended.
    fn signal(&self);

    /// Block until the thread has exited.
    fn wait(&self);

    /// Replace the callable; takes effect at the next iteration.
    fn set_task(&self, task: TaskFn);

    fn set_period(&self, period: Duration);

    fn period(&self) -> Duration;

    fn state(&self) -> TaskState;

    /// Number of completed iterations.
    fn iterations(&self) -> u64;

    fn execution_measure(&self, enable: bool);

    fn execution_measure_count(&self, window: usize);

    fn periodic_measure(&self, enable: bool);

    fn periodic_measure_count(&self, window: usize);

    fn exec_stat(&self) -> Option<Statistics>;

    fn period_stat(&self) -> Option<Statistics>;
}
