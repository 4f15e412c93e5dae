// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process fast path: the OutPort hands the value itself to the InPort.

use crate::connector::ConnectorInfo;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Latest directly delivered value of an InPort.
pub(crate) struct DirectSlot<T> {
    value: Mutex<Option<T>>,
    fresh: AtomicBool,
}

impl<T: Clone> DirectSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: Mutex::new(None),
            fresh: AtomicBool::new(false),
        }
    }

    pub(crate) fn store(&self, value: T) {
        *self.value.lock() = Some(value);
        self.fresh.store(true, Ordering::Release);
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }

    /// The stored value if it has not been taken yet; clears the flag.
    pub(crate) fn take_fresh(&self) -> Option<T> {
        let value = self.value.lock();
        if self.fresh.swap(false, Ordering::AcqRel) {
            value.clone()
        } else {
            None
        }
    }
}

/// One direct connection, shared by both ports.
pub(crate) struct DirectLink<T> {
    pub(crate) info: ConnectorInfo,
    slot: Weak<DirectSlot<T>>,
    alive: AtomicBool,
}

impl<T: Clone> DirectLink<T> {
    pub(crate) fn new(info: ConnectorInfo, slot: &Arc<DirectSlot<T>>) -> Self {
        Self {
            info,
            slot: Arc::downgrade(slot),
            alive: AtomicBool::new(true),
        }
    }

    /// Deliver `value`; `false` once the link or the InPort is gone.
    pub(crate) fn deliver(&self, value: &T) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        match self.slot.upgrade() {
            Some(slot) => {
                slot.store(value.clone());
                true
            }
            None => false,
        }
    }

    pub(crate) fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.slot.strong_count() > 0
    }
}
