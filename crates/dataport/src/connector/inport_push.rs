// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InPort end of a push connection.

use super::{ConnectorInfo, InPortConnector};
use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::config::Properties;
use crate::error::Result;
use crate::listener::{ConnectorEvents, DataListenerKind, ListenerKind};
use crate::status::{BufferStatus, DataPortStatus};
use crate::transport::InPortProvider;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Buffers what an [`InPortProvider`] receives until the port reads it.
pub struct InPortPushConnector {
    events: Arc<ConnectorEvents>,
    endian: Endian,
    buffer: Arc<CdrBuffer>,
    provider: Mutex<Option<Box<dyn InPortProvider>>>,
    closed: AtomicBool,
}

impl InPortPushConnector {
    /// Attach an initialized `provider`; call
    /// [`publish_interface`](Self::publish_interface) next.
    ///
    /// `buffer` is the port's shared buffer, if it uses one.
    ///
    /// # Errors
    /// Invalid buffer properties.
    pub fn new(
        events: Arc<ConnectorEvents>,
        mut provider: Box<dyn InPortProvider>,
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
            let me: Weak<dyn InPortConnector> = me.clone();
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

impl InPortConnector for InPortPushConnector {
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
        let (status, sample) = self.buffer.read(None);
        match (status, sample) {
            (BufferStatus::Ok, Some(sample)) => {
                *data = sample;
                self.events.fire_data(DataListenerKind::OnBufferRead, data);
                DataPortStatus::PortOk
            }
            (BufferStatus::Empty, _) => {
                self.events.fire(ListenerKind::OnBufferEmpty);
                DataPortStatus::BufferEmpty
            }
            (BufferStatus::Timeout, _) => {
                self.events.fire(ListenerKind::OnBufferReadTimeout);
                DataPortStatus::BufferTimeout
            }
            (BufferStatus::PreconditionNotMet, _) => DataPortStatus::PreconditionNotMet,
            _ => DataPortStatus::PortError,
        }
    }

    fn write(&self, data: ByteData) -> BufferStatus {
        if self.closed.load(Ordering::Acquire) {
            return BufferStatus::PreconditionNotMet;
        }
        let (status, dropped) = self.buffer.write_report(data, None);
        if let Some(mut dropped) = dropped {
            self.events
                .fire_data(DataListenerKind::OnBufferOverwrite, &mut dropped);
        }
        status
    }

    fn disconnect(&self) -> DataPortStatus {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DataPortStatus::PortOk;
        }
        // Dropping the provider withdraws its endpoint.
        drop(self.provider.lock().take());
        self.events.fire(ListenerKind::OnDisconnect);
        log::debug!("[{}] push connector disconnected", self.events.info().id);
        DataPortStatus::PortOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;
    use crate::listener::ConnectorListeners;
    use crate::transport::{LocalEndpointTable, LocalInPortProvider};

    fn connector(props: Properties) -> Arc<InPortPushConnector> {
        let info = ConnectorInfo::new("c", "c-1", Vec::new(), props);
        let events = Arc::new(ConnectorEvents::new(
            info,
            Arc::new(ConnectorListeners::new()),
        ));
        let provider = Box::new(LocalInPortProvider::new(Arc::new(LocalEndpointTable::new())));
        InPortPushConnector::new(events, provider, None).expect("connector")
    }

    #[test]
    fn test_read_maps_buffer_outcomes() {
        let c = connector(
            Properties::new()
                .with(keys::BUFFER_LENGTH, "2")
                .with(keys::BUFFER_EMPTY_POLICY, "do_nothing"),
        );
        let mut data = ByteData::new();
        assert_eq!(c.read(&mut data), DataPortStatus::BufferEmpty);
        assert_eq!(c.events.listeners().fired(ListenerKind::OnBufferEmpty), 1);

        assert_eq!(
            c.write(ByteData::from_vec(vec![1, 2], Endian::Little)),
            BufferStatus::Ok
        );
        assert_eq!(c.read(&mut data), DataPortStatus::PortOk);
        assert_eq!(data.as_slice(), &[1, 2]);
        assert_eq!(
            c.events
                .listeners()
                .data_fired(DataListenerKind::OnBufferRead),
            1
        );
    }

    #[test]
    fn test_overwrite_reports_dropped_sample() {
        let c = connector(Properties::new().with(keys::BUFFER_LENGTH, "1"));
        let dropped = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&dropped);
        c.events
            .listeners()
            .add_data_fn(DataListenerKind::OnBufferOverwrite, move |_, data| {
                sink.lock().push(data.as_slice().to_vec());
                crate::listener::ListenerReturn::NoChange
            });

        c.write(ByteData::from_vec(vec![1], Endian::Little));
        c.write(ByteData::from_vec(vec![2], Endian::Little));
        assert_eq!(*dropped.lock(), vec![vec![1u8]]);
    }

    #[test]
    fn test_disconnect_is_idempotent_and_closes_writes() {
        let c = connector(Properties::new());
        assert_eq!(c.disconnect(), DataPortStatus::PortOk);
        assert_eq!(c.disconnect(), DataPortStatus::PortOk);
        assert_eq!(c.events.listeners().fired(ListenerKind::OnDisconnect), 1);
        assert_eq!(
            c.write(ByteData::from_vec(vec![0], Endian::Little)),
            BufferStatus::PreconditionNotMet
        );
    }
}
