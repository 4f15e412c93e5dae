// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publishers: the sending half of a push connection.
//!
//! An OutPort push connector hands every encoded sample to its publisher,
//! which decides when the consumer sees it:
//!
//! - [`PublisherPeriodic`] buffers samples and drains them from a periodic
//!   task according to a [`PushPolicy`].
//! - [`PublisherFlush`] calls the consumer synchronously inside `write()`.
//!
//! Both raise the connector's events and translate buffer and consumer
//! outcomes with the same two tables, [`write_status`] and
//! [`delivery_status`].

mod flush;
mod periodic;
mod policy;

pub use flush::PublisherFlush;
pub use periodic::PublisherPeriodic;
pub use policy::PushPolicy;

use crate::buffer::CdrBuffer;
use crate::cdr::ByteData;
use crate::config::Properties;
use crate::listener::{ConnectorEvents, DataListenerKind};
use crate::status::{BufferStatus, DataPortStatus};
use crate::transport::InPortConsumer;
use std::sync::Arc;
use std::time::Duration;

/// Interface shared by every publisher.
///
/// Set-up (`init`, `set_*`) happens before the publisher is shared; the data
/// path (`write`, `activate`, `deactivate`) takes `&self`.
pub trait PublisherBase: Send + Sync {
    /// Read policy and scheduling properties.
    fn init(&mut self, props: &Properties) -> DataPortStatus;

    fn set_consumer(&mut self, consumer: Arc<dyn InPortConsumer>) -> DataPortStatus;

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>) -> DataPortStatus;

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) -> DataPortStatus;

    /// Accept one encoded sample.
    fn write(&self, data: &ByteData, timeout: Option<Duration>) -> DataPortStatus;

    fn is_active(&self) -> bool;

    fn activate(&self) -> DataPortStatus;

    fn deactivate(&self) -> DataPortStatus;
}

/// Map the outcome of a buffer write, raising the matching event.
pub fn write_status(
    status: BufferStatus,
    events: &ConnectorEvents,
    data: &mut ByteData,
) -> DataPortStatus {
    match status {
        BufferStatus::Ok => DataPortStatus::PortOk,
        BufferStatus::BufferError => DataPortStatus::BufferError,
        BufferStatus::Full => {
            events.fire_data(DataListenerKind::OnBufferFull, data);
            DataPortStatus::BufferFull
        }
        BufferStatus::NotSupported => DataPortStatus::PortError,
        BufferStatus::Timeout => {
            events.fire_data(DataListenerKind::OnBufferWriteTimeout, data);
            DataPortStatus::BufferTimeout
        }
        BufferStatus::PreconditionNotMet => DataPortStatus::PreconditionNotMet,
        BufferStatus::Empty => DataPortStatus::PortError,
    }
}

/// Map a failed `consumer.put()`, raising the matching receiver event.
pub fn delivery_status(
    status: DataPortStatus,
    events: &ConnectorEvents,
    data: &mut ByteData,
) -> DataPortStatus {
    match status {
        DataPortStatus::SendFull => {
            events.fire_data(DataListenerKind::OnReceiverFull, data);
            DataPortStatus::SendFull
        }
        DataPortStatus::SendTimeout => {
            events.fire_data(DataListenerKind::OnReceiverTimeout, data);
            DataPortStatus::SendTimeout
        }
        DataPortStatus::PortError
        | DataPortStatus::ConnectionLost
        | DataPortStatus::UnknownError => {
            events.fire_data(DataListenerKind::OnReceiverError, data);
            status
        }
        _ => {
            events.fire_data(DataListenerKind::OnReceiverError, data);
            DataPortStatus::PortError
        }
    }
}

/// Send one sample: ON_SEND, `put()`, then ON_RECEIVED or the error mapping.
pub(crate) fn send(
    consumer: &dyn InPortConsumer,
    events: &ConnectorEvents,
    data: &mut ByteData,
) -> DataPortStatus {
    events.fire_data(DataListenerKind::OnSend, data);
    let ret = consumer.put(data);
    if ret.is_ok() {
        events.fire_data(DataListenerKind::OnReceived, data);
        return DataPortStatus::PortOk;
    }
    log::debug!("{} = consumer.put()", ret);
    delivery_status(ret, events, data)
}
