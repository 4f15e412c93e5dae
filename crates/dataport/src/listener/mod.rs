// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connector event listeners.
//!
//! Connectors, publishers and transports report what happens to each sample
//! (written into a buffer, dropped, sent, received, ...) through a
//! per-connector [`ConnectorListeners`] registry.
//!
//! - *Data* events carry the encoded sample, which listeners may rewrite.
//! - *Plain* events only carry the connector info.
//!
//! # Usage
//!
//! ```rust
//! use dataport::listener::{ConnectorListeners, DataListenerKind, ListenerReturn};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let listeners = ConnectorListeners::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let seen = hits.clone();
//! let handle = listeners.add_data_fn(DataListenerKind::OnBufferFull, move |_info, _data| {
//!     seen.fetch_add(1, Ordering::SeqCst);
//!     ListenerReturn::NoChange
//! });
//! assert!(listeners.remove(handle));
//! ```
//!
//! # Thread Safety
//!
//! Callbacks run on whichever thread raised the event (application writer,
//! publisher task, transport receiver). They must be `Send + Sync` and
//! should return quickly.

mod events;
mod registry;

pub use events::ConnectorEvents;
pub use registry::{ConnectorListeners, ListenerHandle};

use crate::cdr::{decode, encode, ByteData, PortData};
use crate::connector::ConnectorInfo;
use std::marker::PhantomData;

/// Events carrying a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataListenerKind {
    OnBufferWrite,
    OnBufferFull,
    OnBufferWriteTimeout,
    OnBufferOverwrite,
    OnBufferRead,
    OnSend,
    OnReceived,
    OnReceiverFull,
    OnReceiverTimeout,
    OnReceiverError,
}

impl DataListenerKind {
    pub const COUNT: usize = 10;

    pub const ALL: [DataListenerKind; Self::COUNT] = [
        Self::OnBufferWrite,
        Self::OnBufferFull,
        Self::OnBufferWriteTimeout,
        Self::OnBufferOverwrite,
        Self::OnBufferRead,
        Self::OnSend,
        Self::OnReceived,
        Self::OnReceiverFull,
        Self::OnReceiverTimeout,
        Self::OnReceiverError,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnBufferWrite => "ON_BUFFER_WRITE",
            Self::OnBufferFull => "ON_BUFFER_FULL",
            Self::OnBufferWriteTimeout => "ON_BUFFER_WRITE_TIMEOUT",
            Self::OnBufferOverwrite => "ON_BUFFER_OVERWRITE",
            Self::OnBufferRead => "ON_BUFFER_READ",
            Self::OnSend => "ON_SEND",
            Self::OnReceived => "ON_RECEIVED",
            Self::OnReceiverFull => "ON_RECEIVER_FULL",
            Self::OnReceiverTimeout => "ON_RECEIVER_TIMEOUT",
            Self::OnReceiverError => "ON_RECEIVER_ERROR",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Events without a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    OnBufferEmpty,
    OnBufferReadTimeout,
    OnSenderEmpty,
    OnSenderTimeout,
    OnSenderError,
    OnConnect,
    OnDisconnect,
}

impl ListenerKind {
    pub const COUNT: usize = 7;

    pub const ALL: [ListenerKind; Self::COUNT] = [
        Self::OnBufferEmpty,
        Self::OnBufferReadTimeout,
        Self::OnSenderEmpty,
        Self::OnSenderTimeout,
        Self::OnSenderError,
        Self::OnConnect,
        Self::OnDisconnect,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnBufferEmpty => "ON_BUFFER_EMPTY",
            Self::OnBufferReadTimeout => "ON_BUFFER_READ_TIMEOUT",
            Self::OnSenderEmpty => "ON_SENDER_EMPTY",
            Self::OnSenderTimeout => "ON_SENDER_TIMEOUT",
            Self::OnSenderError => "ON_SENDER_ERROR",
            Self::OnConnect => "ON_CONNECT",
            Self::OnDisconnect => "ON_DISCONNECT",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// What a listener did with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerReturn {
    #[default]
    NoChange,
    InfoChanged,
    DataChanged,
    BothChanged,
    /// Skip the remaining listeners of this event.
    Stop,
}

impl ListenerReturn {
    pub fn info_changed(self) -> bool {
        matches!(self, Self::InfoChanged | Self::BothChanged)
    }

    pub fn data_changed(self) -> bool {
        matches!(self, Self::DataChanged | Self::BothChanged)
    }

    /// Combine the outcomes of two listeners of the same event.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self == Self::Stop || other == Self::Stop {
            return Self::Stop;
        }
        let info = self.info_changed() || other.info_changed();
        let data = self.data_changed() || other.data_changed();
        match (info, data) {
            (true, true) => Self::BothChanged,
            (true, false) => Self::InfoChanged,
            (false, true) => Self::DataChanged,
            (false, false) => Self::NoChange,
        }
    }
}

/// Listener for events carrying a sample.
pub trait ConnectorDataListener: Send + Sync {
    fn on_data(&self, info: &mut ConnectorInfo, data: &mut ByteData) -> ListenerReturn;
}

/// Listener for events without a sample.
pub trait ConnectorListener: Send + Sync {
    fn on_event(&self, info: &mut ConnectorInfo) -> ListenerReturn;
}

/// Closure adapter for [`ConnectorDataListener`].
pub struct ClosureDataListener<F> {
    callback: F,
}

impl<F> ClosureDataListener<F>
where
    F: Fn(&mut ConnectorInfo, &mut ByteData) -> ListenerReturn + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ConnectorDataListener for ClosureDataListener<F>
where
    F: Fn(&mut ConnectorInfo, &mut ByteData) -> ListenerReturn + Send + Sync,
{
    fn on_data(&self, info: &mut ConnectorInfo, data: &mut ByteData) -> ListenerReturn {
        (self.callback)(info, data)
    }
}

/// Closure adapter for [`ConnectorListener`].
pub struct ClosureListener<F> {
    callback: F,
}

impl<F> ClosureListener<F>
where
    F: Fn(&mut ConnectorInfo) -> ListenerReturn + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ConnectorListener for ClosureListener<F>
where
    F: Fn(&mut ConnectorInfo) -> ListenerReturn + Send + Sync,
{
    fn on_event(&self, info: &mut ConnectorInfo) -> ListenerReturn {
        (self.callback)(info)
    }
}

/// Data listener that works on decoded values.
///
/// The sample is decoded with the byte order recorded in the [`ByteData`].
/// Returning `DataChanged`/`BothChanged` re-encodes the value in place.
/// Undecodable samples are logged and skipped.
///
/// ```rust
/// use dataport::listener::{ListenerReturn, TypedDataListener};
///
/// let clamp = TypedDataListener::new(|_info, value: &mut i32| {
///     if *value > 100 {
///         *value = 100;
///         ListenerReturn::DataChanged
///     } else {
///         ListenerReturn::NoChange
///     }
/// });
/// # let _ = clamp;
/// ```
pub struct TypedDataListener<T, F> {
    callback: F,
    _phantom: PhantomData<fn(&mut T)>,
}

impl<T, F> TypedDataListener<T, F>
where
    T: PortData,
    F: Fn(&mut ConnectorInfo, &mut T) -> ListenerReturn + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _phantom: PhantomData,
        }
    }
}

impl<T, F> ConnectorDataListener for TypedDataListener<T, F>
where
    T: PortData,
    F: Fn(&mut ConnectorInfo, &mut T) -> ListenerReturn + Send + Sync,
{
    fn on_data(&self, info: &mut ConnectorInfo, data: &mut ByteData) -> ListenerReturn {
        let mut value: T = match decode(data) {
            Ok(v) => v,
            Err(e) => {
                log::warn!(
                    "[{}] typed listener cannot decode {}: {}",
                    info.name,
                    T::type_name(),
                    e
                );
                return ListenerReturn::NoChange;
            }
        };

        let ret = (self.callback)(info, &mut value);
        if ret.data_changed() {
            match encode(&value, data.endian()) {
                Ok(encoded) => *data = encoded,
                Err(e) => log::warn!("[{}] typed listener re-encode failed: {}", info.name, e),
            }
        }
        ret
    }
}
