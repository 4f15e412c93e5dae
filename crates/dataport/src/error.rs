// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Set-up time errors.
//!
//! The data path never returns `Err`: it reports [`DataPortStatus`] values.
//! [`Error`] is reserved for building and wiring things (bad configuration,
//! unknown transport names, failed negotiation, thread creation).

use crate::cdr::SerError;
use crate::status::DataPortStatus;

/// Errors returned while configuring ports, connectors and tasks.
///
/// # Example
///
/// ```rust
/// use dataport::{Error, Runtime};
///
/// let runtime = Runtime::new();
/// match runtime.publishers.create("periodic") {
///     Err(Error::UnknownFactory { kind, name }) => {
///         assert_eq!(kind, "publisher");
///         assert_eq!(name, "periodic");
///     }
///     _ => unreachable!("empty runtime has no publishers"),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A property value is missing or out of range.
    InvalidConfig(String),
    /// No factory registered under that name.
    UnknownFactory {
        /// Registry kind ("publisher", "inport_provider", ...).
        kind: &'static str,
        /// Requested identifier.
        name: String,
    },
    /// The two ports share no byte order.
    EndianMismatch {
        /// Byte orders the OutPort accepts.
        outport: String,
        /// Byte orders the InPort accepts.
        inport: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// A consumer could not subscribe to the published interface.
    SubscriptionFailed(String),
    /// A provider could not publish its interface.
    PublicationFailed(String),
    /// No connector with that id on the port.
    ConnectorNotFound(String),
    /// A connector with that id already exists on the port.
    DuplicateConnector(String),
    /// A component returned a non-OK status during set-up.
    Status(DataPortStatus),
    /// Operation is not valid in the current state.
    InvalidState(String),

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// Spawning a background thread failed.
    ThreadSpawn(std::io::Error),
    /// Socket or file I/O failed.
    Io(std::io::Error),
    /// Encoding or decoding a sample failed.
    Serialization(SerError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::UnknownFactory { kind, name } => {
                write!(f, "No {} factory registered as '{}'", kind, name)
            }
            Error::EndianMismatch { outport, inport } => write!(
                f,
                "Endian mismatch: outport accepts [{}], inport accepts [{}]",
                outport, inport
            ),
            Error::SubscriptionFailed(msg) => write!(f, "Interface subscription failed: {}", msg),
            Error::PublicationFailed(msg) => write!(f, "Interface publication failed: {}", msg),
            Error::ConnectorNotFound(id) => write!(f, "Connector not found: {}", id),
            Error::DuplicateConnector(id) => write!(f, "Connector already exists: {}", id),
            Error::Status(status) => write!(f, "Operation returned {}", status),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::ThreadSpawn(e) => write!(f, "Thread spawn failed: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serialization(e) => write!(f, "Serialization failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ThreadSpawn(e) | Error::Io(e) => Some(e),
            Error::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<SerError> for Error {
    fn from(e: SerError) -> Self {
        Error::Serialization(e)
    }
}

/// Convenient alias for set-up results.
pub type Result<T> = core::result::Result<T, Error>;
