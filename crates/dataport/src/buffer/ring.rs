// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity circular buffer.
//!
//! # Invariants
//!
//! - `0 <= readable() <= length()`
//! - `readable() + writable() == length()`
//! - Under `DoNothing`/`Block` a write never overtakes an unconsumed slot.
//! - Slots keep their value after being read, so the read pointer may step
//!   back over already-read samples (`advance_rptr(-n)`, readback).
//!
//! One mutex guards the pointers; `not_full` and `not_empty` wake blocked
//! writers and readers. The lock is held for a single operation only.
//!
//! A reader that sends a sample before consuming it peeks with
//! [`RingBuffer::get_tagged`] and consumes with [`RingBuffer::commit_read`].
//! An `Overwrite` landing in between moves the read pointer past the tagged
//! sample, and the commit then leaves the pointer alone.

use super::policy::{BufferConfig, EmptyPolicy, FullPolicy};
use crate::config::Properties;
use crate::error::{Error, Result};
use crate::status::BufferStatus;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct RingState<T> {
    slots: Vec<Option<T>>,
    wpos: usize,
    rpos: usize,
    fill: usize,
    /// Total samples ever committed; readback needs at least one.
    wcount: u64,
    /// Sequence number of the sample under the read pointer.
    rseq: u64,
    /// Sample handed out by `get_tagged` and not yet committed or released.
    in_flight: Option<u64>,
}

impl<T> RingState<T> {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn is_full(&self) -> bool {
        self.fill == self.slots.len()
    }

    fn step(&self, pos: usize, n: isize) -> usize {
        let len = self.len() as isize;
        (pos as isize + n).rem_euclid(len) as usize
    }
}

/// Bounded FIFO shared between one writer side and one reader side.
///
/// # Example
///
/// ```rust
/// use dataport::buffer::{BufferConfig, FullPolicy, RingBuffer};
/// use dataport::BufferStatus;
///
/// let ring = RingBuffer::new(BufferConfig::with_length(2).full_policy(FullPolicy::DoNothing))
///     .expect("non-zero length");
/// assert_eq!(ring.write(1u32, None), BufferStatus::Ok);
/// assert_eq!(ring.write(2u32, None), BufferStatus::Ok);
/// assert_eq!(ring.write(3u32, None), BufferStatus::Full);
/// assert_eq!(ring.read(None), (BufferStatus::Ok, Some(1)));
/// ```
pub struct RingBuffer<T> {
    state: Mutex<RingState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    config: BufferConfig,
}

impl<T: Clone + Send> RingBuffer<T> {
    /// # Errors
    /// [`Error::InvalidConfig`] when `config.length` is zero.
    pub fn new(config: BufferConfig) -> Result<Self> {
        if config.length == 0 {
            return Err(Error::InvalidConfig("buffer length must be > 0".into()));
        }
        let slots = (0..config.length).map(|_| None).collect();
        Ok(Self {
            state: Mutex::new(RingState {
                slots,
                wpos: 0,
                rpos: 0,
                fill: 0,
                wcount: 0,
                rseq: 0,
                in_flight: None,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            config,
        })
    }

    /// Build from the `buffer.*` keys of a property set.
    ///
    /// # Errors
    /// See [`BufferConfig::from_properties`].
    pub fn from_properties(props: &Properties) -> Result<Self> {
        Self::new(BufferConfig::from_properties(props)?)
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    pub fn length(&self) -> usize {
        self.config.length
    }

    /// Store `value` according to the full policy.
    ///
    /// `timeout` overrides the configured write timeout for `Block`.
    pub fn write(&self, value: T, timeout: Option<Duration>) -> BufferStatus {
        self.write_report(value, timeout).0
    }

    /// Like [`write`](Self::write), also returning the sample dropped by an
    /// `Overwrite`, if any.
    pub fn write_report(&self, value: T, timeout: Option<Duration>) -> (BufferStatus, Option<T>) {
        let mut st = self.state.lock();
        let mut overwrote = false;

        if st.is_full() {
            match self.config.full_policy {
                FullPolicy::Overwrite => {
                    // Oldest unread sample sits under the write pointer.
                    // A sample already in flight is not reported as dropped.
                    overwrote = st.in_flight != Some(st.rseq);
                    st.rpos = st.step(st.rpos, 1);
                    st.rseq += 1;
                    st.fill -= 1;
                }
                FullPolicy::DoNothing => return (BufferStatus::Full, None),
                FullPolicy::Block => {
                    let deadline = deadline(timeout.or(self.config.write_timeout));
                    if !wait_while(&self.not_full, &mut st, deadline, |s| s.is_full()) {
                        return (BufferStatus::Timeout, None);
                    }
                }
            }
        }

        let wpos = st.wpos;
        let old = st.slots[wpos].replace(value);
        let dropped = if overwrote { old } else { None };

        st.wpos = st.step(wpos, 1);
        st.fill += 1;
        st.wcount += 1;
        drop(st);
        self.not_empty.notify_one();

        (BufferStatus::Ok, dropped)
    }

    /// Take the oldest unread sample according to the empty policy.
    ///
    /// `timeout` overrides the configured read timeout for `Block`.
    pub fn read(&self, timeout: Option<Duration>) -> (BufferStatus, Option<T>) {
        let mut st = self.state.lock();

        if st.fill == 0 {
            match self.config.empty_policy {
                EmptyPolicy::Readback => {
                    if st.wcount == 0 {
                        return (BufferStatus::Empty, None);
                    }
                    st.rpos = st.step(st.rpos, -1);
                    st.rseq = st.rseq.saturating_sub(1);
                    st.fill = 1;
                }
                EmptyPolicy::DoNothing => return (BufferStatus::Empty, None),
                EmptyPolicy::Block => {
                    let deadline = deadline(timeout.or(self.config.read_timeout));
                    if !wait_while(&self.not_empty, &mut st, deadline, |s| s.fill == 0) {
                        return (BufferStatus::Timeout, None);
                    }
                }
            }
        }

        let rpos = st.rpos;
        let Some(value) = st.slots[rpos].clone() else {
            return (BufferStatus::BufferError, None);
        };
        st.rpos = st.step(rpos, 1);
        st.rseq += 1;
        st.fill -= 1;
        drop(st);
        self.not_full.notify_one();

        (BufferStatus::Ok, Some(value))
    }

    /// Peek the sample under the read pointer.
    pub fn get(&self) -> Option<T> {
        let st = self.state.lock();
        st.slots[st.rpos].clone()
    }

    /// Peek the oldest unread sample and mark it in flight.
    ///
    /// Returns the sample with its sequence number, to be handed to
    /// [`commit_read`](Self::commit_read) once sent or to
    /// [`release_read`](Self::release_read) when sending failed.
    pub fn get_tagged(&self) -> Option<(u64, T)> {
        let mut st = self.state.lock();
        if st.fill == 0 {
            return None;
        }
        let value = st.slots[st.rpos].clone()?;
        let seq = st.rseq;
        st.in_flight = Some(seq);
        Some((seq, value))
    }

    /// Consume the sample tagged `seq`.
    ///
    /// When an `Overwrite` already dropped it the read pointer stays put.
    /// `PreconditionNotMet` if the read pointer was stepped back behind `seq`.
    pub fn commit_read(&self, seq: u64) -> BufferStatus {
        let mut st = self.state.lock();
        st.in_flight = None;
        if st.rseq > seq {
            return BufferStatus::Ok;
        }
        if st.rseq < seq || st.fill == 0 {
            return BufferStatus::PreconditionNotMet;
        }
        st.rpos = st.step(st.rpos, 1);
        st.rseq += 1;
        st.fill -= 1;
        drop(st);
        self.not_full.notify_one();
        BufferStatus::Ok
    }

    /// Give up on the sample tagged `seq` without consuming it.
    ///
    /// Returns `true` when an `Overwrite` dropped it while in flight; the
    /// caller then owns the only copy.
    pub fn release_read(&self, seq: u64) -> bool {
        let mut st = self.state.lock();
        st.in_flight = None;
        st.rseq > seq
    }

    /// Peek `offset` slots past the read pointer.
    pub fn get_at(&self, offset: usize) -> Option<T> {
        let st = self.state.lock();
        let pos = (st.rpos + offset) % st.len();
        st.slots[pos].clone()
    }

    /// Store at the write pointer without advancing it.
    pub fn put(&self, value: T) -> BufferStatus {
        let mut st = self.state.lock();
        let wpos = st.wpos;
        st.slots[wpos] = Some(value);
        BufferStatus::Ok
    }

    /// Commit (`n > 0`) or retract (`n < 0`) slots at the write pointer.
    pub fn advance_wptr(&self, n: isize) -> BufferStatus {
        let mut st = self.state.lock();
        let len = st.len();
        let ok = if n >= 0 {
            n.unsigned_abs() <= len - st.fill
        } else {
            n.unsigned_abs() <= st.fill
        };
        if !ok {
            return BufferStatus::PreconditionNotMet;
        }
        st.wpos = st.step(st.wpos, n);
        if n >= 0 {
            st.fill += n.unsigned_abs();
            st.wcount += n.unsigned_abs() as u64;
        } else {
            st.fill -= n.unsigned_abs();
        }
        drop(st);
        if n > 0 {
            self.not_empty.notify_all();
        } else if n < 0 {
            self.not_full.notify_all();
        }
        BufferStatus::Ok
    }

    /// Consume (`n > 0`) samples, or step back (`n < 0`) over already-read
    /// slots so they become readable again.
    pub fn advance_rptr(&self, n: isize) -> BufferStatus {
        let mut st = self.state.lock();
        let len = st.len();
        let ok = if n >= 0 {
            n.unsigned_abs() <= st.fill
        } else {
            let back = n.unsigned_abs();
            let ever_written = usize::try_from(st.wcount).unwrap_or(usize::MAX).min(len);
            st.fill + back <= ever_written
        };
        if !ok {
            return BufferStatus::PreconditionNotMet;
        }
        st.rpos = st.step(st.rpos, n);
        if n >= 0 {
            st.fill -= n.unsigned_abs();
            st.rseq += n.unsigned_abs() as u64;
        } else {
            st.fill += n.unsigned_abs();
            st.rseq = st.rseq.saturating_sub(n.unsigned_abs() as u64);
        }
        drop(st);
        if n > 0 {
            self.not_full.notify_all();
        } else if n < 0 {
            self.not_empty.notify_all();
        }
        BufferStatus::Ok
    }

    pub fn readable(&self) -> usize {
        self.state.lock().fill
    }

    pub fn writable(&self) -> usize {
        let st = self.state.lock();
        st.len() - st.fill
    }

    pub fn full(&self) -> bool {
        self.state.lock().is_full()
    }

    pub fn empty(&self) -> bool {
        self.state.lock().fill == 0
    }

    /// Drop every sample and rewind both pointers.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        for slot in &mut st.slots {
            *slot = None;
        }
        st.wpos = 0;
        st.rpos = 0;
        st.fill = 0;
        st.wcount = 0;
        st.rseq = 0;
        st.in_flight = None;
        drop(st);
        self.not_full.notify_all();
    }
}

fn deadline(timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| Instant::now().checked_add(t))
}

/// Wait on `cond` while `blocked` holds. Returns `false` on timeout.
fn wait_while<T>(
    cond: &Condvar,
    guard: &mut MutexGuard<'_, RingState<T>>,
    deadline: Option<Instant>,
    blocked: impl Fn(&RingState<T>) -> bool,
) -> bool {
    while blocked(&**guard) {
        match deadline {
            None => cond.wait(guard),
            Some(d) => {
                if cond.wait_until(guard, d).timed_out() && blocked(&**guard) {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ring(length: usize, full: FullPolicy, empty: EmptyPolicy) -> RingBuffer<u32> {
        RingBuffer::new(
            BufferConfig::with_length(length)
                .full_policy(full)
                .empty_policy(empty)
                .write_timeout(Some(Duration::from_millis(50)))
                .read_timeout(Some(Duration::from_millis(50))),
        )
        .expect("valid config")
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(RingBuffer::<u32>::new(BufferConfig::with_length(0)).is_err());
    }

    #[test]
    fn test_randomized_fifo_order() {
        let rb = ring(4, FullPolicy::DoNothing, EmptyPolicy::DoNothing);
        let mut next_in = 0u32;
        let mut next_out = 0u32;
        for _ in 0..500 {
            if fastrand::bool() {
                if rb.write(next_in, None) == BufferStatus::Ok {
                    next_in += 1;
                }
            } else if let (BufferStatus::Ok, Some(v)) = rb.read(None) {
                assert_eq!(v, next_out);
                next_out += 1;
            }
            assert!(rb.readable() <= rb.length());
            assert_eq!(rb.readable() + rb.writable(), rb.length());
        }
    }

    #[test]
    fn test_do_nothing_rejects_when_full() {
        let rb = ring(2, FullPolicy::DoNothing, EmptyPolicy::DoNothing);
        assert_eq!(rb.write(1, None), BufferStatus::Ok);
        assert_eq!(rb.write(2, None), BufferStatus::Ok);
        assert_eq!(rb.write(3, None), BufferStatus::Full);
        assert_eq!(rb.readable(), 2);
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(1)));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(2)));
        assert_eq!(rb.read(None), (BufferStatus::Empty, None));
    }

    #[test]
    fn test_overwrite_reports_dropped_sample() {
        let rb = ring(3, FullPolicy::Overwrite, EmptyPolicy::DoNothing);
        for v in 0..3 {
            assert_eq!(rb.write_report(v, None), (BufferStatus::Ok, None));
        }
        assert_eq!(rb.write_report(3, None), (BufferStatus::Ok, Some(0)));
        assert_eq!(rb.write_report(4, None), (BufferStatus::Ok, Some(1)));
        assert!(rb.full());
        let drained: Vec<u32> = (0..3).filter_map(|_| rb.read(None).1).collect();
        assert_eq!(drained, vec![2, 3, 4]);
    }

    #[test]
    fn test_overwrite_on_reused_slot_is_not_reported() {
        let rb = ring(2, FullPolicy::Overwrite, EmptyPolicy::DoNothing);
        assert_eq!(rb.write_report(1, None), (BufferStatus::Ok, None));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(1)));
        assert_eq!(rb.write_report(2, None), (BufferStatus::Ok, None));
        assert_eq!(rb.write_report(3, None), (BufferStatus::Ok, None));
        assert_eq!(rb.write_report(4, None), (BufferStatus::Ok, Some(2)));
    }

    #[test]
    fn test_block_write_times_out() {
        let rb = ring(1, FullPolicy::Block, EmptyPolicy::DoNothing);
        assert_eq!(rb.write(1, None), BufferStatus::Ok);
        let start = Instant::now();
        assert_eq!(rb.write(2, None), BufferStatus::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(45));
        assert_eq!(rb.readable(), 1);
    }

    #[test]
    fn test_block_write_released_by_reader() {
        let rb = Arc::new(ring(1, FullPolicy::Block, EmptyPolicy::DoNothing));
        assert_eq!(rb.write(1, None), BufferStatus::Ok);

        let writer = {
            let rb = rb.clone();
            thread::spawn(move || rb.write(2, Some(Duration::from_secs(5))))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(1)));
        assert_eq!(writer.join().expect("writer thread"), BufferStatus::Ok);
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(2)));
    }

    #[test]
    fn test_block_read_times_out_then_receives() {
        let rb = Arc::new(ring(2, FullPolicy::DoNothing, EmptyPolicy::Block));
        assert_eq!(rb.read(None), (BufferStatus::Timeout, None));

        let reader = {
            let rb = rb.clone();
            thread::spawn(move || rb.read(Some(Duration::from_secs(5))))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rb.write(9, None), BufferStatus::Ok);
        assert_eq!(reader.join().expect("reader thread"), (BufferStatus::Ok, Some(9)));
    }

    #[test]
    fn test_readback_returns_last_read() {
        let rb = ring(3, FullPolicy::DoNothing, EmptyPolicy::Readback);
        assert_eq!(rb.read(None), (BufferStatus::Empty, None));
        rb.write(5, None);
        rb.write(6, None);
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(5)));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(6)));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(6)));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(6)));
        assert!(rb.empty());
    }

    #[test]
    fn test_pointer_arithmetic() {
        let rb = ring(4, FullPolicy::DoNothing, EmptyPolicy::DoNothing);
        for v in 10..13 {
            rb.write(v, None);
        }
        assert_eq!(rb.get(), Some(10));
        assert_eq!(rb.get_at(2), Some(12));
        assert_eq!(rb.advance_rptr(4), BufferStatus::PreconditionNotMet);
        assert_eq!(rb.advance_rptr(2), BufferStatus::Ok);
        assert_eq!(rb.get(), Some(12));

        // Step back over the two consumed samples.
        assert_eq!(rb.advance_rptr(-2), BufferStatus::Ok);
        assert_eq!(rb.readable(), 3);
        assert_eq!(rb.get(), Some(10));
        // Slot 3 was never written.
        assert_eq!(rb.advance_rptr(-1), BufferStatus::PreconditionNotMet);

        assert_eq!(rb.put(13), BufferStatus::Ok);
        assert_eq!(rb.readable(), 3);
        assert_eq!(rb.advance_wptr(1), BufferStatus::Ok);
        assert!(rb.full());
        assert_eq!(rb.advance_wptr(1), BufferStatus::PreconditionNotMet);
        assert_eq!(rb.get_at(3), Some(13));

        rb.reset();
        assert!(rb.empty());
        assert_eq!(rb.get(), None);
    }

    #[test]
    fn test_commit_after_overwrite_keeps_next_sample() {
        let rb = ring(2, FullPolicy::Overwrite, EmptyPolicy::DoNothing);
        rb.write(1, None);
        rb.write(2, None);

        let (seq, value) = rb.get_tagged().expect("sample in flight");
        assert_eq!(value, 1);
        // Drops the in-flight sample, which is not reported.
        assert_eq!(rb.write_report(3, None), (BufferStatus::Ok, None));
        assert_eq!(rb.commit_read(seq), BufferStatus::Ok);

        assert_eq!(rb.readable(), 2);
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(2)));
        assert_eq!(rb.read(None), (BufferStatus::Ok, Some(3)));
    }

    #[test]
    fn test_release_after_overwrite_hands_back_ownership() {
        let rb = ring(1, FullPolicy::Overwrite, EmptyPolicy::DoNothing);
        rb.write(1, None);
        let (seq, _) = rb.get_tagged().expect("sample in flight");
        assert!(!rb.release_read(seq));
        assert_eq!(rb.readable(), 1);

        let (seq, _) = rb.get_tagged().expect("sample in flight");
        assert_eq!(rb.write_report(2, None), (BufferStatus::Ok, None));
        assert!(rb.release_read(seq));
        // No longer in flight: the next overwrite reports its victim.
        assert_eq!(rb.write_report(3, None), (BufferStatus::Ok, Some(2)));
    }

    #[test]
    fn test_commit_consumes_in_order() {
        let rb = ring(3, FullPolicy::DoNothing, EmptyPolicy::DoNothing);
        assert!(rb.get_tagged().is_none());
        rb.write(7, None);
        rb.write(8, None);
        let (first, value) = rb.get_tagged().expect("sample");
        assert_eq!(value, 7);
        assert_eq!(rb.commit_read(first), BufferStatus::Ok);
        let (second, value) = rb.get_tagged().expect("sample");
        assert_eq!((second, value), (first + 1, 8));
        assert_eq!(rb.advance_rptr(-1), BufferStatus::Ok);
        assert_eq!(rb.commit_read(second), BufferStatus::PreconditionNotMet);
    }
}
