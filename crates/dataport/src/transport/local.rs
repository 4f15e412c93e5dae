// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process transport.
//!
//! Providers register an endpoint in a [`LocalEndpointTable`] and publish its
//! key in the connector profile; consumers resolve the key back to the
//! endpoint. Samples are fully encoded, so a local link behaves like a remote
//! one minus the socket. The table holds weak references only: when the
//! provider goes away, consumers observe `CONNECTION_LOST`.

use super::{
    cache_fetched, get_status, put_status, receive, serve, InPortConsumer, InPortProvider,
    OutPortConsumer, OutPortProvider,
};
use crate::buffer::CdrBuffer;
use crate::cdr::ByteData;
use crate::config::{keys, Properties};
use crate::connector::{InPortConnector, OutPortConnector};
use crate::error::Result;
use crate::listener::ConnectorEvents;
use crate::status::DataPortStatus;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Interface type name of this transport.
pub const LOCAL_INTERFACE: &str = "local";

struct InPortEndpoint {
    connector: Option<Weak<dyn InPortConnector>>,
    events: Option<Arc<ConnectorEvents>>,
}

impl InPortEndpoint {
    fn put(&self, data: ByteData) -> DataPortStatus {
        receive(self.connector.as_ref(), self.events.as_ref(), data)
    }
}

struct OutPortEndpoint {
    buffer: Arc<CdrBuffer>,
    events: Arc<ConnectorEvents>,
    connector: Option<Weak<dyn OutPortConnector>>,
}

impl OutPortEndpoint {
    fn get(&self) -> (DataPortStatus, Option<ByteData>) {
        if let Some(connector) = &self.connector {
            if connector.strong_count() == 0 {
                return (DataPortStatus::PortError, None);
            }
        }
        serve(&self.buffer, &self.events)
    }
}

/// Registry of in-process endpoints, owned by a [`Runtime`](crate::Runtime).
#[derive(Default)]
pub struct LocalEndpointTable {
    inports: DashMap<String, Weak<InPortEndpoint>>,
    outports: DashMap<String, Weak<OutPortEndpoint>>,
    next_id: AtomicU64,
}

impl LocalEndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_key(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn register_inport(&self, endpoint: &Arc<InPortEndpoint>) -> String {
        let key = self.next_key("local-in");
        self.inports.insert(key.clone(), Arc::downgrade(endpoint));
        key
    }

    fn register_outport(&self, endpoint: &Arc<OutPortEndpoint>) -> String {
        let key = self.next_key("local-out");
        self.outports.insert(key.clone(), Arc::downgrade(endpoint));
        key
    }

    fn lookup_inport(&self, key: &str) -> Option<Weak<InPortEndpoint>> {
        self.inports.get(key).map(|e| e.value().clone())
    }

    fn lookup_outport(&self, key: &str) -> Option<Weak<OutPortEndpoint>> {
        self.outports.get(key).map(|e| e.value().clone())
    }

    /// Number of live InPort endpoints.
    pub fn inport_count(&self) -> usize {
        self.inports.iter().filter(|e| e.value().strong_count() > 0).count()
    }

    /// Number of live OutPort endpoints.
    pub fn outport_count(&self) -> usize {
        self.outports.iter().filter(|e| e.value().strong_count() > 0).count()
    }

    /// Forget every endpoint. Existing consumers keep their weak handle.
    pub fn clear(&self) {
        self.inports.clear();
        self.outports.clear();
    }
}

/// Push receiver registered in a [`LocalEndpointTable`].
pub struct LocalInPortProvider {
    table: Arc<LocalEndpointTable>,
    connector: Option<Weak<dyn InPortConnector>>,
    events: Option<Arc<ConnectorEvents>>,
    endpoint: Option<(String, Arc<InPortEndpoint>)>,
}

impl LocalInPortProvider {
    pub fn new(table: Arc<LocalEndpointTable>) -> Self {
        Self {
            table,
            connector: None,
            events: None,
            endpoint: None,
        }
    }
}

impl InPortProvider for LocalInPortProvider {
    fn interface_type(&self) -> &str {
        LOCAL_INTERFACE
    }

    fn init(&mut self, _props: &Properties) -> Result<()> {
        Ok(())
    }

    // Samples reach the buffer through the connector.
    fn set_buffer(&mut self, _buffer: Arc<CdrBuffer>) {}

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) {
        self.events = Some(events);
    }

    fn set_connector(&mut self, connector: Weak<dyn InPortConnector>) {
        self.connector = Some(connector);
    }

    fn publish_interface(&mut self, props: &mut Properties) -> bool {
        if self.endpoint.is_none() {
            let endpoint = Arc::new(InPortEndpoint {
                connector: self.connector.clone(),
                events: self.events.clone(),
            });
            let key = self.table.register_inport(&endpoint);
            log::debug!("[local] inport endpoint {} published", key);
            self.endpoint = Some((key, endpoint));
        }
        if let Some((key, _)) = &self.endpoint {
            props.set(keys::LOCAL_INPORT_REF, key.clone());
        }
        true
    }

    fn put(&self, data: ByteData) -> DataPortStatus {
        match &self.endpoint {
            Some((_, endpoint)) => endpoint.put(data),
            None => receive(self.connector.as_ref(), self.events.as_ref(), data),
        }
    }
}

impl Drop for LocalInPortProvider {
    fn drop(&mut self) {
        if let Some((key, _)) = self.endpoint.take() {
            self.table.inports.remove(&key);
        }
    }
}

/// Push sender resolving a [`LocalInPortProvider`] through the table.
pub struct LocalInPortConsumer {
    table: Arc<LocalEndpointTable>,
    target: RwLock<Option<(String, Weak<InPortEndpoint>)>>,
}

impl LocalInPortConsumer {
    pub fn new(table: Arc<LocalEndpointTable>) -> Self {
        Self {
            table,
            target: RwLock::new(None),
        }
    }
}

impl InPortConsumer for LocalInPortConsumer {
    fn interface_type(&self) -> &str {
        LOCAL_INTERFACE
    }

    fn init(&mut self, _props: &Properties) -> Result<()> {
        Ok(())
    }

    // The publisher raises the send-side events.
    fn set_listener(&mut self, _events: Arc<ConnectorEvents>) {}

    fn subscribe_interface(&mut self, props: &Properties) -> bool {
        let Some(key) = props.get(keys::LOCAL_INPORT_REF) else {
            log::warn!("[local] profile has no {}", keys::LOCAL_INPORT_REF);
            return false;
        };
        match self.table.lookup_inport(key) {
            Some(endpoint) => {
                *self.target.write() = Some((key.to_string(), endpoint));
                true
            }
            None => {
                log::warn!("[local] unknown inport endpoint {}", key);
                false
            }
        }
    }

    fn unsubscribe_interface(&self, props: &Properties) {
        let mut target = self.target.write();
        let matches = match (&*target, props.get(keys::LOCAL_INPORT_REF)) {
            (Some((current, _)), Some(key)) => current == key,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if matches {
            *target = None;
        }
    }

    fn put(&self, data: &ByteData) -> DataPortStatus {
        let endpoint = self
            .target
            .read()
            .as_ref()
            .and_then(|(_, weak)| weak.upgrade());
        match endpoint {
            Some(endpoint) => put_status(endpoint.put(data.clone())),
            None => DataPortStatus::ConnectionLost,
        }
    }
}

/// Pull server exposing an OutPort connector buffer.
pub struct LocalOutPortProvider {
    table: Arc<LocalEndpointTable>,
    buffer: Option<Arc<CdrBuffer>>,
    events: Option<Arc<ConnectorEvents>>,
    connector: Option<Weak<dyn OutPortConnector>>,
    endpoint: Option<(String, Arc<OutPortEndpoint>)>,
}

impl LocalOutPortProvider {
    pub fn new(table: Arc<LocalEndpointTable>) -> Self {
        Self {
            table,
            buffer: None,
            events: None,
            connector: None,
            endpoint: None,
        }
    }
}

impl OutPortProvider for LocalOutPortProvider {
    fn interface_type(&self) -> &str {
        LOCAL_INTERFACE
    }

    fn init(&mut self, _props: &Properties) -> Result<()> {
        Ok(())
    }

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>) {
        self.buffer = Some(buffer);
    }

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) {
        self.events = Some(events);
    }

    fn set_connector(&mut self, connector: Weak<dyn OutPortConnector>) {
        self.connector = Some(connector);
    }

    fn publish_interface(&mut self, props: &mut Properties) -> bool {
        if self.endpoint.is_none() {
            let (Some(buffer), Some(events)) = (self.buffer.clone(), self.events.clone()) else {
                log::warn!("[local] outport provider published before buffer/listener set");
                return false;
            };
            let endpoint = Arc::new(OutPortEndpoint {
                buffer,
                events,
                connector: self.connector.clone(),
            });
            let key = self.table.register_outport(&endpoint);
            log::debug!("[local] outport endpoint {} published", key);
            self.endpoint = Some((key, endpoint));
        }
        if let Some((key, _)) = &self.endpoint {
            props.set(keys::LOCAL_OUTPORT_REF, key.clone());
        }
        true
    }

    fn get(&self) -> (DataPortStatus, Option<ByteData>) {
        match &self.endpoint {
            Some((_, endpoint)) => endpoint.get(),
            None => (DataPortStatus::PreconditionNotMet, None),
        }
    }
}

impl Drop for LocalOutPortProvider {
    fn drop(&mut self) {
        if let Some((key, _)) = self.endpoint.take() {
            self.table.outports.remove(&key);
        }
    }
}

/// Pull client fetching from a [`LocalOutPortProvider`].
pub struct LocalOutPortConsumer {
    table: Arc<LocalEndpointTable>,
    buffer: Option<Arc<CdrBuffer>>,
    events: Option<Arc<ConnectorEvents>>,
    target: RwLock<Option<(String, Weak<OutPortEndpoint>)>>,
}

impl LocalOutPortConsumer {
    pub fn new(table: Arc<LocalEndpointTable>) -> Self {
        Self {
            table,
            buffer: None,
            events: None,
            target: RwLock::new(None),
        }
    }
}

impl OutPortConsumer for LocalOutPortConsumer {
    fn interface_type(&self) -> &str {
        LOCAL_INTERFACE
    }

    fn init(&mut self, _props: &Properties) -> Result<()> {
        Ok(())
    }

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>) {
        self.buffer = Some(buffer);
    }

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) {
        self.events = Some(events);
    }

    fn subscribe_interface(&mut self, props: &Properties) -> bool {
        let Some(key) = props.get(keys::LOCAL_OUTPORT_REF) else {
            log::warn!("[local] profile has no {}", keys::LOCAL_OUTPORT_REF);
            return false;
        };
        match self.table.lookup_outport(key) {
            Some(endpoint) => {
                *self.target.write() = Some((key.to_string(), endpoint));
                true
            }
            None => {
                log::warn!("[local] unknown outport endpoint {}", key);
                false
            }
        }
    }

    fn unsubscribe_interface(&self, _props: &Properties) {
        *self.target.write() = None;
    }

    fn get(&self, data: &mut ByteData) -> DataPortStatus {
        let (Some(buffer), Some(events)) = (&self.buffer, &self.events) else {
            return DataPortStatus::PreconditionNotMet;
        };
        let endpoint = self
            .target
            .read()
            .as_ref()
            .and_then(|(_, weak)| weak.upgrade());
        let Some(endpoint) = endpoint else {
            return DataPortStatus::ConnectionLost;
        };

        match endpoint.get() {
            (DataPortStatus::PortOk, Some(fetched)) => {
                *data = fetched;
                cache_fetched(buffer, events, data);
                DataPortStatus::PortOk
            }
            (DataPortStatus::PortOk, None) => DataPortStatus::UnknownError,
            (status, _) => get_status(status, events),
        }
    }
}
