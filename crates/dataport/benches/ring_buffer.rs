// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ring Buffer Benchmark
//!
//! Measures write/read cost of the connector buffer with:
//! - Payload sizes (8B, 256B, 4KB)
//! - Full policies (overwrite vs do_nothing)

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dataport::buffer::{BufferConfig, CdrBuffer, EmptyPolicy, FullPolicy};
use dataport::{ByteData, Endian};
use std::hint::black_box as bb;

fn buffer(length: usize, full: FullPolicy) -> CdrBuffer {
    CdrBuffer::new(
        BufferConfig::with_length(length)
            .full_policy(full)
            .empty_policy(EmptyPolicy::DoNothing),
    )
    .expect("buffer creation")
}

/// Write then read one sample
fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_write_read");

    for size in [8usize, 256, 4096] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let ring = buffer(8, FullPolicy::Overwrite);
            let sample = ByteData::from_vec(vec![0xAB; size], Endian::Little);
            b.iter(|| {
                ring.write(bb(sample.clone()), None);
                bb(ring.read(None));
            });
        });
    }

    group.finish();
}

/// Writes against a permanently full buffer
fn bench_full_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_full_policy");

    for (name, policy) in [
        ("overwrite", FullPolicy::Overwrite),
        ("do_nothing", FullPolicy::DoNothing),
    ] {
        group.bench_function(name, |b| {
            let ring = buffer(4, policy);
            let sample = ByteData::from_vec(vec![0u8; 64], Endian::Little);
            for _ in 0..4 {
                ring.write(sample.clone(), None);
            }
            b.iter(|| bb(ring.write(bb(sample.clone()), None)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_full_policies);
criterion_main!(benches);
