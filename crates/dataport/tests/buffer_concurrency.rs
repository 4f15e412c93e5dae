// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ring buffer under concurrent writers and readers
//!
//! Single-thread policy behavior is covered by the unit tests; these run a
//! producer and a consumer on separate threads.

use dataport::buffer::{BufferConfig, EmptyPolicy, FullPolicy, RingBuffer};
use dataport::BufferStatus;
use std::time::{Duration, Instant};

fn blocking(length: usize, timeout: Option<Duration>) -> RingBuffer<u64> {
    RingBuffer::new(
        BufferConfig::with_length(length)
            .full_policy(FullPolicy::Block)
            .empty_policy(EmptyPolicy::Block)
            .write_timeout(timeout)
            .read_timeout(timeout),
    )
    .expect("Failed to create buffer")
}

#[test]
fn test_blocking_fifo_preserves_order_under_contention() {
    let count = 2_000u64;
    let length = fastrand::usize(1..=16);
    let ring = blocking(length, Some(Duration::from_secs(5)));

    let received = crossbeam::scope(|s| {
        s.spawn(|_| {
            for i in 0..count {
                assert_eq!(ring.write(i, None), BufferStatus::Ok);
                if fastrand::u8(..) < 8 {
                    std::thread::yield_now();
                }
            }
        });
        let reader = s.spawn(|_| {
            (0..count)
                .map(|_| match ring.read(None) {
                    (BufferStatus::Ok, Some(v)) => v,
                    other => panic!("unexpected read result {:?}", other),
                })
                .collect::<Vec<_>>()
        });
        reader.join().expect("reader panicked")
    })
    .expect("scope panicked");

    assert_eq!(received, (0..count).collect::<Vec<_>>());
    assert!(ring.empty());
}

#[test]
fn test_blocked_writer_released_by_reader() {
    let ring = blocking(1, Some(Duration::from_secs(5)));
    assert_eq!(ring.write(1, None), BufferStatus::Ok);

    crossbeam::scope(|s| {
        let writer = s.spawn(|_| {
            let start = Instant::now();
            let status = ring.write(2, None);
            (status, start.elapsed())
        });
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(ring.read(None), (BufferStatus::Ok, Some(1)));

        let (status, waited) = writer.join().expect("writer panicked");
        assert_eq!(status, BufferStatus::Ok);
        assert!(waited >= Duration::from_millis(20));
    })
    .expect("scope panicked");

    assert_eq!(ring.read(None), (BufferStatus::Ok, Some(2)));
}

#[test]
fn test_blocked_reader_times_out_then_recovers() {
    let ring = blocking(2, Some(Duration::from_millis(30)));

    let start = Instant::now();
    assert_eq!(ring.read(None), (BufferStatus::Timeout, None));
    assert!(start.elapsed() >= Duration::from_millis(25));

    crossbeam::scope(|s| {
        let reader = s.spawn(|_| ring.read(Some(Duration::from_secs(5))));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ring.write(9, None), BufferStatus::Ok);
        assert_eq!(
            reader.join().expect("reader panicked"),
            (BufferStatus::Ok, Some(9))
        );
    })
    .expect("scope panicked");
}

#[test]
fn test_overwrite_keeps_newest_window() {
    let length = fastrand::usize(2..=8);
    let ring = RingBuffer::new(BufferConfig::with_length(length).empty_policy(EmptyPolicy::DoNothing))
        .expect("buffer");
    let total = length as u64 * 3 + fastrand::u64(0..5);

    for i in 0..total {
        assert_eq!(ring.write(i, None), BufferStatus::Ok);
    }
    let kept: Vec<u64> = std::iter::from_fn(|| ring.read(None).1).collect();
    let expected: Vec<u64> = (total - length as u64..total).collect();
    assert_eq!(kept, expected);
}
