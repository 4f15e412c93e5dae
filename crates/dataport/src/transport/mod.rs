// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport shims between connectors and the wire.
//!
//! Four roles, one trait each:
//!
//! | Role | Lives on | Push | Pull |
//! |------|----------|------|------|
//! | [`InPortProvider`] | InPort | receives `put()` | - |
//! | [`InPortConsumer`] | OutPort | calls remote `put()` | - |
//! | [`OutPortProvider`] | OutPort | - | serves `get()` |
//! | [`OutPortConsumer`] | InPort | - | calls remote `get()` |
//!
//! Providers publish how to reach them by writing keys into the connector
//! profile (`publish_interface`); consumers read those keys back
//! (`subscribe_interface`). Set-up methods take `&mut self` and run before
//! the object is shared; data-path methods take `&self`.
//!
//! # Modules
//!
//! - `local` - in-process transport through a [`LocalEndpointTable`]
//! - `udp` - fire-and-forget datagram push transport (feature `udp`)

mod local;
#[cfg(feature = "udp")]
mod udp;

pub use local::{
    LocalEndpointTable, LocalInPortConsumer, LocalInPortProvider, LocalOutPortConsumer,
    LocalOutPortProvider,
};
#[cfg(feature = "udp")]
pub use udp::{UdpInPortConsumer, UdpInPortProvider};

use crate::buffer::CdrBuffer;
use crate::cdr::ByteData;
use crate::config::Properties;
use crate::connector::{InPortConnector, OutPortConnector};
use crate::error::Result;
use crate::listener::{ConnectorEvents, DataListenerKind, ListenerKind};
use crate::status::{BufferStatus, DataPortStatus};
use std::sync::{Arc, Weak};

/// Receiving end of a push connection.
pub trait InPortProvider: Send + Sync {
    fn interface_type(&self) -> &str;

    /// # Errors
    /// Invalid transport properties.
    fn init(&mut self, props: &Properties) -> Result<()>;

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>);

    fn set_listener(&mut self, events: Arc<ConnectorEvents>);

    fn set_connector(&mut self, connector: Weak<dyn InPortConnector>);

    /// Make the endpoint reachable and describe it in `props`.
    fn publish_interface(&mut self, props: &mut Properties) -> bool;

    /// Accept one sample from the sending side.
    ///
    /// Returns `PortOk`, `BufferFull`, `BufferTimeout`, `PortError` or
    /// `UnknownError`; the consumer translates these for its publisher.
    fn put(&self, data: ByteData) -> DataPortStatus;
}

/// Sending end of a push connection.
pub trait InPortConsumer: Send + Sync {
    fn interface_type(&self) -> &str;

    /// # Errors
    /// Invalid transport properties.
    fn init(&mut self, props: &Properties) -> Result<()>;

    fn set_buffer(&mut self, _buffer: Arc<CdrBuffer>) {}

    fn set_listener(&mut self, events: Arc<ConnectorEvents>);

    /// Describe the consumer side in `props` (nothing for most transports).
    fn publish_interface_profile(&self, _props: &mut Properties) {}

    /// Locate the provider described in `props`.
    fn subscribe_interface(&mut self, props: &Properties) -> bool;

    fn unsubscribe_interface(&self, props: &Properties);

    /// Deliver one sample.
    fn put(&self, data: &ByteData) -> DataPortStatus;
}

/// Serving end of a pull connection.
pub trait OutPortProvider: Send + Sync {
    fn interface_type(&self) -> &str;

    /// # Errors
    /// Invalid transport properties.
    fn init(&mut self, props: &Properties) -> Result<()>;

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>);

    fn set_listener(&mut self, events: Arc<ConnectorEvents>);

    fn set_connector(&mut self, connector: Weak<dyn OutPortConnector>);

    fn publish_interface(&mut self, props: &mut Properties) -> bool;

    /// Hand out the next buffered sample.
    fn get(&self) -> (DataPortStatus, Option<ByteData>);
}

/// Fetching end of a pull connection.
pub trait OutPortConsumer: Send + Sync {
    fn interface_type(&self) -> &str;

    /// # Errors
    /// Invalid transport properties.
    fn init(&mut self, props: &Properties) -> Result<()>;

    /// Local cache the fetched samples are recorded in.
    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>);

    fn set_listener(&mut self, events: Arc<ConnectorEvents>);

    fn subscribe_interface(&mut self, props: &Properties) -> bool;

    fn unsubscribe_interface(&self, props: &Properties);

    /// Fetch one sample into `data`.
    fn get(&self, data: &mut ByteData) -> DataPortStatus;
}

/// Receive path shared by the bundled providers.
///
/// Retags the sample with the connector's byte order, writes it into the
/// connector and maps the buffer outcome, raising the matching events.
pub(crate) fn receive(
    connector: Option<&Weak<dyn InPortConnector>>,
    events: Option<&Arc<ConnectorEvents>>,
    mut data: ByteData,
) -> DataPortStatus {
    let Some(connector) = connector.and_then(Weak::upgrade) else {
        if let Some(events) = events {
            events.fire_data(DataListenerKind::OnReceiverError, &mut data);
        }
        return DataPortStatus::PortError;
    };
    let events = events.unwrap_or_else(|| connector.events());

    data.set_endian(connector.endian());
    events.fire_data(DataListenerKind::OnReceived, &mut data);

    let status = connector.write(data.clone());
    match status {
        BufferStatus::Ok => {
            events.fire_data(DataListenerKind::OnBufferWrite, &mut data);
            DataPortStatus::PortOk
        }
        BufferStatus::BufferError | BufferStatus::PreconditionNotMet => {
            events.fire_data(DataListenerKind::OnReceiverError, &mut data);
            DataPortStatus::PortError
        }
        BufferStatus::Full => {
            events.fire_data(DataListenerKind::OnBufferFull, &mut data);
            events.fire_data(DataListenerKind::OnReceiverFull, &mut data);
            DataPortStatus::BufferFull
        }
        BufferStatus::Empty => DataPortStatus::BufferEmpty,
        BufferStatus::Timeout => {
            events.fire_data(DataListenerKind::OnBufferWriteTimeout, &mut data);
            events.fire_data(DataListenerKind::OnReceiverTimeout, &mut data);
            DataPortStatus::BufferTimeout
        }
        BufferStatus::NotSupported => DataPortStatus::UnknownError,
    }
}

/// Translate a provider's answer into what a push consumer reports.
pub(crate) fn put_status(remote: DataPortStatus) -> DataPortStatus {
    match remote {
        DataPortStatus::PortOk => DataPortStatus::PortOk,
        DataPortStatus::PortError => DataPortStatus::PortError,
        DataPortStatus::BufferFull => DataPortStatus::SendFull,
        DataPortStatus::BufferTimeout => DataPortStatus::SendTimeout,
        _ => DataPortStatus::UnknownError,
    }
}

/// Serve one sample from `buffer`, raising the sender-side events.
pub(crate) fn serve(buffer: &CdrBuffer, events: &ConnectorEvents) -> (DataPortStatus, Option<ByteData>) {
    let (status, data) = buffer.read(None);
    match (status, data) {
        (BufferStatus::Ok, Some(mut data)) => {
            events.fire_data(DataListenerKind::OnBufferRead, &mut data);
            events.fire_data(DataListenerKind::OnSend, &mut data);
            (DataPortStatus::PortOk, Some(data))
        }
        (BufferStatus::Empty, _) => {
            events.fire(ListenerKind::OnBufferEmpty);
            events.fire(ListenerKind::OnSenderEmpty);
            (DataPortStatus::BufferEmpty, None)
        }
        (BufferStatus::Timeout, _) => {
            events.fire(ListenerKind::OnBufferReadTimeout);
            events.fire(ListenerKind::OnSenderTimeout);
            (DataPortStatus::BufferTimeout, None)
        }
        (BufferStatus::BufferError | BufferStatus::PreconditionNotMet | BufferStatus::Ok, _) => {
            events.fire(ListenerKind::OnSenderError);
            (DataPortStatus::PortError, None)
        }
        (BufferStatus::Full | BufferStatus::NotSupported, _) => {
            (DataPortStatus::UnknownError, None)
        }
    }
}

/// Record a fetched sample into the pull cache, raising receiver events.
pub(crate) fn cache_fetched(buffer: &CdrBuffer, events: &ConnectorEvents, data: &mut ByteData) {
    events.fire_data(DataListenerKind::OnReceived, data);
    events.fire_data(DataListenerKind::OnBufferWrite, data);
    if buffer.full() {
        log::info!("pull cache buffer is full");
        events.fire_data(DataListenerKind::OnBufferFull, data);
        events.fire_data(DataListenerKind::OnReceiverFull, data);
    }
    buffer.put(data.clone());
    buffer.advance_wptr(1);
    buffer.advance_rptr(1);
}

/// Map a failed pull answer, raising the sender-side events.
pub(crate) fn get_status(remote: DataPortStatus, events: &ConnectorEvents) -> DataPortStatus {
    match remote {
        DataPortStatus::PortOk => DataPortStatus::PortOk,
        DataPortStatus::BufferFull => DataPortStatus::BufferFull,
        DataPortStatus::BufferEmpty => {
            events.fire(ListenerKind::OnSenderEmpty);
            DataPortStatus::BufferEmpty
        }
        DataPortStatus::BufferTimeout => {
            events.fire(ListenerKind::OnSenderTimeout);
            DataPortStatus::BufferTimeout
        }
        DataPortStatus::PortError => {
            events.fire(ListenerKind::OnSenderError);
            DataPortStatus::PortError
        }
        _ => {
            events.fire(ListenerKind::OnSenderError);
            DataPortStatus::UnknownError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_status_table() {
        assert_eq!(put_status(DataPortStatus::PortOk), DataPortStatus::PortOk);
        assert_eq!(put_status(DataPortStatus::BufferFull), DataPortStatus::SendFull);
        assert_eq!(
            put_status(DataPortStatus::BufferTimeout),
            DataPortStatus::SendTimeout
        );
        assert_eq!(put_status(DataPortStatus::PortError), DataPortStatus::PortError);
        assert_eq!(
            put_status(DataPortStatus::BufferEmpty),
            DataPortStatus::UnknownError
        );
    }
}
