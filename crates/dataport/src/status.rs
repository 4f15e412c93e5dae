// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status codes shared by every layer of the data path.
//!
//! Two closed enumerations:
//!
//! - [`DataPortStatus`] is the universal success/error channel returned by
//!   publishers, connectors, consumers and ports.
//! - [`BufferStatus`] is internal to the ring buffer. It is translated into a
//!   `DataPortStatus` at the buffer/publisher/connector boundary and never
//!   surfaces on a port API.
//!
//! Neither type is an error in the Rust sense: a full buffer or a lost
//! connection is an operational outcome, reported by value.

use std::fmt;

/// Outcome of a data-port level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataPortStatus {
    /// Operation succeeded.
    #[default]
    PortOk = 0,
    /// Generic port failure.
    PortError,
    /// Buffer reported an internal error.
    BufferError,
    /// Local buffer is full.
    BufferFull,
    /// Local buffer is empty.
    BufferEmpty,
    /// Local buffer operation timed out.
    BufferTimeout,
    /// Remote side reported its buffer full.
    SendFull,
    /// Remote side timed out while accepting data.
    SendTimeout,
    /// Remote side had no data to hand out.
    RecvEmpty,
    /// Remote side timed out while handing out data.
    RecvTimeout,
    /// Caller passed an invalid argument.
    InvalidArgs,
    /// Operation called before its prerequisites were set.
    PreconditionNotMet,
    /// Transport lost its peer.
    ConnectionLost,
    /// Anything else.
    UnknownError,
}

impl DataPortStatus {
    /// Every status, in declaration order.
    pub const ALL: [DataPortStatus; 14] = [
        Self::PortOk,
        Self::PortError,
        Self::BufferError,
        Self::BufferFull,
        Self::BufferEmpty,
        Self::BufferTimeout,
        Self::SendFull,
        Self::SendTimeout,
        Self::RecvEmpty,
        Self::RecvTimeout,
        Self::InvalidArgs,
        Self::PreconditionNotMet,
        Self::ConnectionLost,
        Self::UnknownError,
    ];

    /// Canonical upper-case name (`"PORT_OK"`, `"BUFFER_FULL"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PortOk => "PORT_OK",
            Self::PortError => "PORT_ERROR",
            Self::BufferError => "BUFFER_ERROR",
            Self::BufferFull => "BUFFER_FULL",
            Self::BufferEmpty => "BUFFER_EMPTY",
            Self::BufferTimeout => "BUFFER_TIMEOUT",
            Self::SendFull => "SEND_FULL",
            Self::SendTimeout => "SEND_TIMEOUT",
            Self::RecvEmpty => "RECV_EMPTY",
            Self::RecvTimeout => "RECV_TIMEOUT",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::PreconditionNotMet => "PRECONDITION_NOT_MET",
            Self::ConnectionLost => "CONNECTION_LOST",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// `true` only for [`DataPortStatus::PortOk`].
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::PortOk)
    }
}

impl fmt::Display for DataPortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-connector status list, as kept by ports after a write.
pub type DataPortStatusList = Vec<DataPortStatus>;

/// Outcome of a ring buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferStatus {
    Ok,
    BufferError,
    Full,
    Empty,
    Timeout,
    PreconditionNotMet,
    NotSupported,
}

impl BufferStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "BUFFER_OK",
            Self::BufferError => "BUFFER_ERROR",
            Self::Full => "BUFFER_FULL",
            Self::Empty => "BUFFER_EMPTY",
            Self::Timeout => "TIMEOUT",
            Self::PreconditionNotMet => "PRECONDITION_NOT_MET",
            Self::NotSupported => "NOT_SUPPORTED",
        }
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for BufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
