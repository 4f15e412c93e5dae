// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed ports and the connection protocol between them.
//!
//! ```text
//!  OutPort<T> ──encode──▶ OutPortConnector ──transport──▶ InPortConnector ──decode──▶ InPort<T>
//!       │                                                                               ▲
//!       └──────────────────────────── direct (value copy) ──────────────────────────────┘
//! ```
//!
//! [`connect`] negotiates a byte order, then lets the side that serves the
//! data publish its interface into the profile and the other side subscribe
//! to it:
//!
//! | `dataport.dataflow_type` | publishes | subscribes |
//! |--------------------------|-----------|------------|
//! | `push` (default) | InPort provider | OutPort consumer + publisher |
//! | `pull` | OutPort provider | InPort consumer |
//!
//! `dataport.interface_type = "direct"` skips both: the OutPort copies each
//! value into the InPort.

mod connect;
mod direct;
mod inport;
mod listeners;
mod outport;
mod profile;

pub use connect::{connect, disconnect};
pub use inport::{BufferMode, InPort, InPortBuilder};
pub use listeners::PortListenerHandle;
pub use outport::{OutPort, OutPortBuilder};
pub use profile::ConnectorProfile;

use crate::cdr::Endian;
use crate::config::{keys, Properties, DEFAULT_ENDIAN};
use crate::error::{Error, Result};

/// Byte orders listed under `dataport.serializer.cdr.endian` (default
/// `little,big`).
pub(crate) fn endian_list(props: &Properties) -> Result<Vec<Endian>> {
    let raw = props.get_or(keys::SERIALIZER_ENDIAN, DEFAULT_ENDIAN);
    let list = Endian::parse_list(raw);
    if list.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "{} has no known byte order: '{}'",
            keys::SERIALIZER_ENDIAN,
            raw
        )));
    }
    Ok(list)
}

fn join(list: &[Endian]) -> String {
    list.iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
