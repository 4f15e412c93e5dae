// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InPort end of a pull connection.

use super::{ConnectorInfo, InPortConnector};
use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::error::Result;
use crate::listener::{ConnectorEvents, ListenerKind};
use crate::status::{BufferStatus, DataPortStatus};
use crate::transport::OutPortConsumer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fetches from the OutPort on every read; the local buffer only caches
/// what was fetched.
pub struct InPortPullConnector {
    events: Arc<ConnectorEvents>,
    endian: Endian,
    buffer: Arc<CdrBuffer>,
    consumer: Arc<dyn OutPortConsumer>,
    closed: AtomicBool,
}

impl InPortPullConnector {
    /// Wrap an already subscribed `consumer`.
    ///
    /// The cache is private to the connector, also on a port with a shared
    /// buffer.
    ///
    /// # Errors
    /// Invalid buffer properties.
    pub fn new(
        events: Arc<ConnectorEvents>,
        mut consumer: Box<dyn OutPortConsumer>,
    ) -> Result<Self> {
        let info = events.info();
        let buffer = Arc::new(CdrBuffer::from_properties(&info.properties)?);
        consumer.set_buffer(Arc::clone(&buffer));
        consumer.set_listener(Arc::clone(&events));
        Ok(Self {
            endian: info.endian(),
            events,
            buffer,
            consumer: Arc::from(consumer),
            closed: AtomicBool::new(false),
        })
    }
}

impl InPortConnector for InPortPullConnector {
    fn profile(&self) -> Arc<ConnectorInfo> {
        self.events.info()
    }

    fn endian(&self) -> Endian {
        self.endian
    }

    fn buffer(&self) -> &Arc<CdrBuffer> {
        &self.buffer
    }

    fn events(&self) -> &Arc<ConnectorEvents> {
        &self.events
    }

    fn read(&self, data: &mut ByteData) -> DataPortStatus {
        if self.closed.load(Ordering::Acquire) {
            return DataPortStatus::PreconditionNotMet;
        }
        let status = self.consumer.get(data);
        if status.is_ok() {
            data.set_endian(self.endian);
        }
        status
    }

    // Data only arrives through `read()`.
    fn write(&self, _data: ByteData) -> BufferStatus {
        BufferStatus::NotSupported
    }

    fn disconnect(&self) -> DataPortStatus {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DataPortStatus::PortOk;
        }
        let info = self.events.info();
        self.consumer.unsubscribe_interface(&info.properties);
        self.events.fire(ListenerKind::OnDisconnect);
        log::debug!("[{}] pull connector disconnected", info.id);
        DataPortStatus::PortOk
    }
}
