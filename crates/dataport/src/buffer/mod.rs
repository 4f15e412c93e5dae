// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded FIFO of samples with configurable overflow/underflow policy.
//!
//! Every connector owns a [`RingBuffer`] (or shares its port's one). Writers
//! and readers run on different threads: the application thread writes, the
//! publisher thread or the InPort reader drains. Capacity and policies are
//! fixed at construction through [`BufferConfig`].

mod policy;
mod ring;

pub use policy::{BufferConfig, EmptyPolicy, FullPolicy};
pub use ring::RingBuffer;

use crate::cdr::ByteData;

/// Buffer of encoded samples, as held by connectors.
pub type CdrBuffer = RingBuffer<ByteData>;
