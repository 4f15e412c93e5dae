// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OutPort end of a pull connection.

use super::{ConnectorInfo, OutPortConnector};
use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::config::Properties;
use crate::error::Result;
use crate::listener::{ConnectorEvents, DataListenerKind, ListenerKind};
use crate::publisher::write_status;
use crate::status::DataPortStatus;
use crate::transport::OutPortProvider;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Stores samples in its buffer; an [`OutPortProvider`] serves them to the
/// InPort on request.
pub struct OutPortPullConnector {
    events: Arc<ConnectorEvents>,
    endian: Endian,
    buffer: Arc<CdrBuffer>,
    provider: Mutex<Option<Box<dyn OutPortProvider>>>,
    closed: AtomicBool,
}

impl OutPortPullConnector {
    /// Attach an initialized `provider`; call
    /// [`publish_interface`](Self::publish_interface) next.
    ///
    /// # Errors
    /// Invalid buffer properties.
    pub fn new(
        events: Arc<ConnectorEvents>,
        mut provider: Box<dyn OutPortProvider>,
        buffer: Option<Arc<CdrBuffer>>,
    ) -> Result<Arc<Self>> {
        let info = events.info();
        let buffer = match buffer {
            Some(buffer) => buffer,
            None => Arc::new(CdrBuffer::from_properties(&info.properties)?),
        };
        provider.set_buffer(Arc::clone(&buffer));
        provider.set_listener(Arc::clone(&events));

        Ok(Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn OutPortConnector> = me.clone();
            provider.set_connector(me);
            Self {
                endian: info.endian(),
                events,
                buffer,
                provider: Mutex::new(Some(provider)),
                closed: AtomicBool::new(false),
            }
        }))
    }

    /// Let the provider describe its endpoint in `props`.
    pub fn publish_interface(&self, props: &mut Properties) -> bool {
        match self.provider.lock().as_mut() {
            Some(provider) => provider.publish_interface(props),
            None => false,
        }
    }
}

impl OutPortConnector for OutPortPullConnector {
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
        if self.closed.load(Ordering::Acquire) {
            return DataPortStatus::PreconditionNotMet;
        }
        let mut data = data.clone();
        self.events
            .fire_data(DataListenerKind::OnBufferWrite, &mut data);
        let (status, dropped) = self.buffer.write_report(data.clone(), None);
        if let Some(mut dropped) = dropped {
            self.events
                .fire_data(DataListenerKind::OnBufferOverwrite, &mut dropped);
        }
        write_status(status, &self.events, &mut data)
    }

    fn disconnect(&self) -> DataPortStatus {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DataPortStatus::PortOk;
        }
        drop(self.provider.lock().take());
        self.events.fire(ListenerKind::OnDisconnect);
        log::debug!("[{}] pull connector disconnected", self.events.info().id);
        DataPortStatus::PortOk
    }
}
