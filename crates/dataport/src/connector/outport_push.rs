// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OutPort end of a push connection.

use super::{ConnectorInfo, OutPortConnector};
use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::config::{keys, DEFAULT_SUBSCRIPTION_TYPE};
use crate::error::{Error, Result};
use crate::listener::{ConnectorEvents, ListenerKind};
use crate::publisher::PublisherBase;
use crate::runtime::Runtime;
use crate::status::DataPortStatus;
use crate::transport::InPortConsumer;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Hands samples to a publisher, which forwards them to an
/// [`InPortConsumer`].
pub struct OutPortPushConnector {
    events: Arc<ConnectorEvents>,
    endian: Endian,
    buffer: Arc<CdrBuffer>,
    consumer: Arc<dyn InPortConsumer>,
    publisher: RwLock<Option<Box<dyn PublisherBase>>>,
    closed: AtomicBool,
}

impl OutPortPushConnector {
    /// Wire an already subscribed `consumer` to the publisher named by
    /// `dataport.subscription_type`.
    ///
    /// # Errors
    /// Unknown publisher name, invalid buffer or publisher properties.
    pub fn new(
        runtime: &Runtime,
        events: Arc<ConnectorEvents>,
        mut consumer: Box<dyn InPortConsumer>,
        buffer: Option<Arc<CdrBuffer>>,
    ) -> Result<Self> {
        let info = events.info();
        let props = &info.properties;
        let buffer = match buffer {
            Some(buffer) => buffer,
            None => Arc::new(CdrBuffer::from_properties(props)?),
        };

        consumer.set_buffer(Arc::clone(&buffer));
        consumer.set_listener(Arc::clone(&events));
        let consumer: Arc<dyn InPortConsumer> = Arc::from(consumer);

        let subscription = props.get_normalized(keys::SUBSCRIPTION_TYPE, DEFAULT_SUBSCRIPTION_TYPE);
        let mut publisher = runtime.publishers.create(&subscription)?;
        let status = publisher.init(props);
        if !status.is_ok() {
            log::error!("[{}] {} publisher init: {}", info.id, subscription, status);
            return Err(Error::Status(status));
        }
        publisher.set_consumer(Arc::clone(&consumer));
        publisher.set_buffer(Arc::clone(&buffer));
        publisher.set_listener(Arc::clone(&events));

        log::debug!(
            "[{}] push connector ready ({} via {})",
            info.id,
            subscription,
            consumer.interface_type()
        );
        Ok(Self {
            endian: info.endian(),
            events,
            buffer,
            consumer,
            publisher: RwLock::new(Some(publisher)),
            closed: AtomicBool::new(false),
        })
    }
}

impl OutPortConnector for OutPortPushConnector {
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

    fn write(&self, data: &ByteData) -> DataPortStatus {
        match self.publisher.read().as_ref() {
            Some(publisher) => publisher.write(data, None),
            None => DataPortStatus::PreconditionNotMet,
        }
    }

    fn activate(&self) {
        if let Some(publisher) = self.publisher.read().as_ref() {
            publisher.activate();
        }
    }

    fn deactivate(&self) {
        if let Some(publisher) = self.publisher.read().as_ref() {
            publisher.deactivate();
        }
    }

    fn disconnect(&self) -> DataPortStatus {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DataPortStatus::PortOk;
        }
        // Dropping the publisher stops its task.
        drop(self.publisher.write().take());
        let info = self.events.info();
        self.consumer.unsubscribe_interface(&info.properties);
        self.events.fire(ListenerKind::OnDisconnect);
        log::debug!("[{}] push connector disconnected", info.id);
        DataPortStatus::PortOk
    }
}
