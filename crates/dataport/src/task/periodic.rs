// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Thread-backed [`PeriodicTaskBase`] implementation.

use super::{PeriodicTaskBase, Statistics, TaskFn, TaskState, TimeMeasure};
use crate::config::DEFAULT_MEASURE_COUNT;
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default iteration period (1 kHz).
const DEFAULT_PERIOD: Duration = Duration::from_millis(1);

struct Control {
    state: TaskState,
    /// `suspend()` called before `activate()`: start parked.
    start_suspended: bool,
    /// One-shot permit for a suspended loop.
    signal: bool,
    period: Duration,
}

struct Measure {
    enabled: bool,
    stat: TimeMeasure,
}

impl Measure {
    fn new() -> Self {
        Self {
            enabled: false,
            stat: TimeMeasure::new(DEFAULT_MEASURE_COUNT),
        }
    }
}

struct Shared {
    name: String,
    control: Mutex<Control>,
    cond: Condvar,
    func: Mutex<Option<TaskFn>>,
    exec: Mutex<Measure>,
    period: Mutex<Measure>,
    iterations: AtomicU64,
}

/// Calls a closure every `period` on a dedicated thread.
///
/// # Example
///
/// ```rust
/// use dataport::task::{PeriodicTask, PeriodicTaskBase, TaskState};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let hits = Arc::new(AtomicU32::new(0));
/// let task = PeriodicTask::new("doc");
/// let h = hits.clone();
/// task.set_task(Box::new(move || {
///     h.fetch_add(1, Ordering::Relaxed);
/// }));
/// task.set_period(Duration::from_millis(1));
/// task.suspend();
/// task.activate().expect("spawn");
/// task.signal();
/// task.finalize();
/// assert_eq!(task.state(), TaskState::Finalized);
/// ```
pub struct PeriodicTask {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    /// `name` becomes the thread name (`dataport-<name>`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                control: Mutex::new(Control {
                    state: TaskState::Idle,
                    start_suspended: false,
                    signal: false,
                    period: DEFAULT_PERIOD,
                }),
                cond: Condvar::new(),
                func: Mutex::new(None),
                exec: Mutex::new(Measure::new()),
                period: Mutex::new(Measure::new()),
                iterations: AtomicU64::new(0),
            }),
            thread: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl PeriodicTaskBase for PeriodicTask {
    fn activate(&self) -> Result<()> {
        let mut ctl = self.shared.control.lock();
        if ctl.state != TaskState::Idle {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("dataport-{}", self.shared.name))
            .spawn(move || run(&shared))
            .map_err(Error::ThreadSpawn)?;

        ctl.state = if ctl.start_suspended {
            TaskState::Suspended
        } else {
            TaskState::Running
        };
        drop(ctl);
        *self.thread.lock() = Some(handle);
        log::debug!("[task:{}] activated", self.shared.name);
        Ok(())
    }

    fn finalize(&self) {
        {
            let mut ctl = self.shared.control.lock();
            if ctl.state == TaskState::Finalized {
                return;
            }
            ctl.state = TaskState::Finalized;
        }
        self.shared.cond.notify_all();
        self.wait();
        log::debug!("[task:{}] finalized", self.shared.name);
    }

    fn suspend(&self) {
        let mut ctl = self.shared.control.lock();
        let state = ctl.state;
        match state {
            TaskState::Idle => ctl.start_suspended = true,
            TaskState::Running => ctl.state = TaskState::Suspended,
            TaskState::Suspended | TaskState::Finalized => {}
        }
    }

    fn resume(&self) {
        let mut ctl = self.shared.control.lock();
        let state = ctl.state;
        match state {
            TaskState::Idle => ctl.start_suspended = false,
            TaskState::Suspended => {
                ctl.state = TaskState::Running;
                drop(ctl);
                self.shared.cond.notify_all();
            }
            TaskState::Running | TaskState::Finalized => {}
        }
    }

    fn signal(&self) {
        let mut ctl = self.shared.control.lock();
        if ctl.state == TaskState::Suspended {
            ctl.signal = true;
            drop(ctl);
            self.shared.cond.notify_all();
        }
    }

    fn wait(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                log::error!("[task:{}] wait() called from its own thread", self.shared.name);
                return;
            }
            let _ = handle.join();
        }
    }

    fn set_task(&self, task: TaskFn) {
        *self.shared.func.lock() = Some(task);
    }

    fn set_period(&self, period: Duration) {
        self.shared.control.lock().period = period;
    }

    fn period(&self) -> Duration {
        self.shared.control.lock().period
    }

    fn state(&self) -> TaskState {
        self.shared.control.lock().state
    }

    fn iterations(&self) -> u64 {
        self.shared.iterations.load(Ordering::Acquire)
    }

    fn execution_measure(&self, enable: bool) {
        self.shared.exec.lock().enabled = enable;
    }

    fn execution_measure_count(&self, window: usize) {
        self.shared.exec.lock().stat.set_window(window);
    }

    fn periodic_measure(&self, enable: bool) {
        self.shared.period.lock().enabled = enable;
    }

    fn periodic_measure_count(&self, window: usize) {
        self.shared.period.lock().stat.set_window(window);
    }

    fn exec_stat(&self) -> Option<Statistics> {
        self.shared.exec.lock().stat.statistics()
    }

    fn period_stat(&self) -> Option<Statistics> {
        self.shared.period.lock().stat.statistics()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.resume();
        self.finalize();
    }
}

/// Block until the loop may run one more iteration. `false` means finalized.
fn wait_runnable(shared: &Shared) -> bool {
    let mut ctl = shared.control.lock();
    loop {
        let state = ctl.state;
        match state {
            TaskState::Finalized => return false,
            TaskState::Running => return true,
            TaskState::Suspended if ctl.signal => {
                ctl.signal = false;
                return true;
            }
            TaskState::Suspended | TaskState::Idle => shared.cond.wait(&mut ctl),
        }
    }
}

fn run(shared: &Shared) {
    log::debug!("[task:{}] thread started", shared.name);

    while wait_runnable(shared) {
        let start = Instant::now();
        {
            let mut period = shared.period.lock();
            if period.enabled {
                period.stat.interval();
            }
        }

        {
            let mut func = shared.func.lock();
            if let Some(f) = func.as_mut() {
                if catch_unwind(AssertUnwindSafe(f)).is_err() {
                    log::error!("[task:{}] callable panicked, continuing", shared.name);
                }
            }
        }
        shared.iterations.fetch_add(1, Ordering::Release);

        {
            let mut exec = shared.exec.lock();
            if exec.enabled {
                exec.stat.record(start.elapsed());
            }
        }

        // Sleep out the rest of the period; only finalize cuts it short.
        let mut ctl = shared.control.lock();
        let Some(deadline) = start.checked_add(ctl.period) else {
            continue;
        };
        while ctl.state != TaskState::Finalized && Instant::now() < deadline {
            shared.cond.wait_until(&mut ctl, deadline);
        }
    }

    log::debug!("[task:{}] thread exiting", shared.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counting_task(period: Duration) -> (PeriodicTask, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new("test");
        let h = hits.clone();
        task.set_task(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        task.set_period(period);
        (task, hits)
    }

    fn wait_for(pred: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if pred() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_activate_runs_and_is_idempotent() {
        let (task, hits) = counting_task(Duration::from_millis(1));
        assert_eq!(task.state(), TaskState::Idle);
        task.activate().expect("spawn");
        task.activate().expect("second activate is a no-op");
        assert_eq!(task.state(), TaskState::Running);
        assert!(wait_for(|| hits.load(Ordering::SeqCst) >= 5));
        task.finalize();
        assert_eq!(task.state(), TaskState::Finalized);
    }

    #[test]
    fn test_each_signal_releases_exactly_one_iteration() {
        let (task, hits) = counting_task(Duration::from_millis(1));
        task.suspend();
        task.activate().expect("spawn");
        assert_eq!(task.state(), TaskState::Suspended);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        for expected in 1..=3 {
            task.signal();
            assert!(wait_for(|| hits.load(Ordering::SeqCst) == expected));
            thread::sleep(Duration::from_millis(10));
            assert_eq!(hits.load(Ordering::SeqCst), expected);
        }
        task.finalize();
    }

    #[test]
    fn test_signal_ignored_while_running() {
        let (task, _hits) = counting_task(Duration::from_millis(1));
        task.activate().expect("spawn");
        task.signal();
        assert!(!task.shared.control.lock().signal);
        task.finalize();
    }

    #[test]
    fn test_finalize_interrupts_long_period() {
        let (task, hits) = counting_task(Duration::from_secs(60));
        task.activate().expect("spawn");
        assert!(wait_for(|| hits.load(Ordering::SeqCst) == 1));
        let start = Instant::now();
        task.finalize();
        assert!(start.elapsed() < Duration::from_secs(5));
        task.finalize();
    }

    #[test]
    fn test_panic_in_callable_does_not_stop_loop() {
        let hits = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new("panicky");
        let h = hits.clone();
        task.set_task(Box::new(move || {
            if h.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first iteration fails");
            }
        }));
        task.activate().expect("spawn");
        assert!(wait_for(|| hits.load(Ordering::SeqCst) >= 3));
        task.finalize();
    }

    #[test]
    fn test_measurements() {
        let (task, _hits) = counting_task(Duration::from_millis(2));
        task.execution_measure(true);
        task.periodic_measure(true);
        task.periodic_measure_count(4);
        task.activate().expect("spawn");
        assert!(wait_for(|| task.iterations() >= 10));
        task.finalize();

        let exec = task.exec_stat().expect("exec samples");
        assert!(exec.count >= 10);
        let period = task.period_stat().expect("period samples");
        assert!(period.count <= 4);
        assert!(period.min >= Duration::from_millis(2));
    }

    #[test]
    fn test_drop_finalizes_suspended_task() {
        let (task, _hits) = counting_task(Duration::from_millis(1));
        task.suspend();
        task.activate().expect("spawn");
        drop(task);
    }
}
