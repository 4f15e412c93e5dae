// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded-window timing statistics.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Summary of the samples currently in a [`TimeMeasure`] window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub std_dev: Duration,
}

/// Keeps the last `window` durations.
///
/// Two ways to feed it: `tick()`/`tack()` around a section measures its
/// duration, `interval()` called at the same point of each cycle measures
/// the cycle period.
#[derive(Debug, Clone)]
pub struct TimeMeasure {
    window: usize,
    samples: VecDeque<Duration>,
    started: Option<Instant>,
}

impl TimeMeasure {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window.min(4096)),
            started: None,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Change the window size, discarding the oldest samples if needed.
    pub fn set_window(&mut self, window: usize) {
        self.window = window.max(1);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
    }

    pub fn tick(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn tack(&mut self) {
        if let Some(start) = self.started.take() {
            self.record(start.elapsed());
        }
    }

    /// Record the time since the previous call.
    pub fn interval(&mut self) {
        let now = Instant::now();
        if let Some(prev) = self.started.replace(now) {
            self.record(now.duration_since(prev));
        }
    }

    pub fn record(&mut self, sample: Duration) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.started = None;
    }

    /// `None` until at least one sample was recorded.
    pub fn statistics(&self) -> Option<Statistics> {
        let count = self.samples.len();
        if count == 0 {
            return None;
        }
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;
        let mut sum = 0.0f64;
        for s in &self.samples {
            min = min.min(*s);
            max = max.max(*s);
            sum += s.as_secs_f64();
        }
        let mean = sum / count as f64;
        let variance = self
            .samples
            .iter()
            .map(|s| {
                let d = s.as_secs_f64() - mean;
                d * d
            })
            .sum::<f64>()
            / count as f64;

        Some(Statistics {
            count,
            min,
            max,
            mean: Duration::from_secs_f64(mean),
            std_dev: Duration::from_secs_f64(variance.sqrt()),
        })
    }
}
