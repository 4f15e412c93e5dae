// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed receiving port.

use super::direct::{DirectLink, DirectSlot};
use super::listeners::{PortListenerHandle, PortListeners};
use super::{endian_list, ConnectorProfile};
use crate::buffer::CdrBuffer;
use crate::cdr::{decode, ByteData, Endian, PortData};
use crate::config::{keys, Properties};
use crate::connector::{ConnectorInfo, InPortConnector, InPortPullConnector, InPortPushConnector};
use crate::error::{Error, Result};
use crate::listener::{
    ClosureDataListener, ClosureListener, ConnectorDataListener, ConnectorEvents,
    ConnectorListener, DataListenerKind, ListenerKind, ListenerReturn,
};
use crate::runtime::Runtime;
use crate::status::DataPortStatus;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

type OnRead = Box<dyn Fn() + Send + Sync>;
type OnReadConvert<T> = Box<dyn Fn(&T) -> T + Send + Sync>;

/// Where an InPort's connectors store received samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferMode {
    /// One buffer per connector, sized by the connection properties.
    #[default]
    PerConnector,
    /// One buffer for every push connection of the port, sized by the port
    /// properties. Pull connections keep their own cache.
    Shared,
}

/// Builder for [`InPort`].
pub struct InPortBuilder<T> {
    name: String,
    initial: T,
    runtime: Option<Arc<Runtime>>,
    properties: Properties,
    mode: BufferMode,
}

impl<T: PortData> InPortBuilder<T> {
    #[must_use]
    pub fn runtime(mut self, runtime: Arc<Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Port-level default for every connection of this port.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    /// Byte orders this port accepts, most preferred first.
    #[must_use]
    pub fn endian(self, accepted: &str) -> Self {
        self.property(keys::SERIALIZER_ENDIAN, accepted)
    }

    #[must_use]
    pub fn shared_buffer(mut self) -> Self {
        self.mode = BufferMode::Shared;
        self
    }

    /// # Errors
    /// Invalid buffer properties (shared mode) or an empty endian list.
    pub fn build(self) -> Result<InPort<T>> {
        endian_list(&self.properties)?;
        let shared = match self.mode {
            BufferMode::Shared => Some(Arc::new(CdrBuffer::from_properties(&self.properties)?)),
            BufferMode::PerConnector => None,
        };
        Ok(InPort {
            name: self.name,
            runtime: self
                .runtime
                .unwrap_or_else(|| Arc::new(Runtime::with_defaults())),
            properties: self.properties,
            mode: self.mode,
            shared,
            value: Mutex::new(self.initial),
            status: Mutex::new(DataPortStatus::PortOk),
            direct: Arc::new(DirectSlot::new()),
            direct_links: RwLock::new(Vec::new()),
            connectors: RwLock::new(Vec::new()),
            listeners: PortListeners::default(),
            on_read: RwLock::new(None),
            on_read_convert: RwLock::new(None),
        })
    }
}

/// Receives typed values from connected [`OutPort`](super::OutPort)s.
///
/// `read()` takes directly delivered data first, then the first connector
/// (`read_from` picks one by name), decodes it and stores it as the port's
/// current value.
pub struct InPort<T: PortData> {
    name: String,
    runtime: Arc<Runtime>,
    properties: Properties,
    mode: BufferMode,
    shared: Option<Arc<CdrBuffer>>,
    value: Mutex<T>,
    status: Mutex<DataPortStatus>,
    direct: Arc<DirectSlot<T>>,
    direct_links: RwLock<Vec<Arc<DirectLink<T>>>>,
    connectors: RwLock<Vec<Arc<dyn InPortConnector>>>,
    listeners: PortListeners,
    on_read: RwLock<Option<OnRead>>,
    on_read_convert: RwLock<Option<OnReadConvert<T>>>,
}

impl<T: PortData> InPort<T> {
    pub fn builder(name: impl Into<String>, initial: T) -> InPortBuilder<T> {
        InPortBuilder {
            name: name.into(),
            initial,
            runtime: None,
            properties: Properties::new(),
            mode: BufferMode::PerConnector,
        }
    }

    /// Port with default properties and its own default runtime.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            name: name.into(),
            runtime: Arc::new(Runtime::with_defaults()),
            properties: Properties::new(),
            mode: BufferMode::PerConnector,
            shared: None,
            value: Mutex::new(initial),
            status: Mutex::new(DataPortStatus::PortOk),
            direct: Arc::new(DirectSlot::new()),
            direct_links: RwLock::new(Vec::new()),
            connectors: RwLock::new(Vec::new()),
            listeners: PortListeners::default(),
            on_read: RwLock::new(None),
            on_read_convert: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn buffer_mode(&self) -> BufferMode {
        self.mode
    }

    /// Last value read.
    pub fn value(&self) -> T {
        self.value.lock().clone()
    }

    /// Outcome of the last `read()`.
    pub fn status(&self) -> DataPortStatus {
        *self.status.lock()
    }

    // ---------------------------------------------------------------------
    // Reading
    // ---------------------------------------------------------------------

    /// Fetch the next value. `false` when nothing could be read.
    pub fn read(&self) -> bool {
        self.notify_read();
        if let Some(value) = self.direct.take_fresh() {
            self.store(value);
            return true;
        }

        let first = self.connectors.read().first().cloned();
        match first {
            Some(connector) => self.read_connector(connector.as_ref()),
            None => {
                let status = if self.direct_links.read().is_empty() {
                    DataPortStatus::PreconditionNotMet
                } else {
                    DataPortStatus::BufferEmpty
                };
                *self.status.lock() = status;
                false
            }
        }
    }

    /// Like [`read`](Self::read), from the connection called `name`.
    pub fn read_from(&self, name: &str) -> bool {
        self.notify_read();
        let direct = self.direct_links.read().iter().any(|l| l.info.name == name);
        if direct {
            return match self.direct.take_fresh() {
                Some(value) => {
                    self.store(value);
                    true
                }
                None => {
                    *self.status.lock() = DataPortStatus::BufferEmpty;
                    false
                }
            };
        }

        let connector = self.find(|c| c.name() == name);
        match connector {
            Some(connector) => self.read_connector(connector.as_ref()),
            None => {
                *self.status.lock() = DataPortStatus::PreconditionNotMet;
                false
            }
        }
    }

    /// Unread data waiting on the direct path or the first connector.
    pub fn is_new(&self) -> bool {
        if self.direct.is_fresh() {
            return true;
        }
        self.connectors
            .read()
            .first()
            .is_some_and(|c| c.buffer().readable() > 0)
    }

    pub fn is_new_from(&self, name: &str) -> bool {
        if self.direct_links.read().iter().any(|l| l.info.name == name) {
            return self.direct.is_fresh();
        }
        self.find(|c| c.name() == name)
            .is_some_and(|c| c.buffer().readable() > 0)
    }

    /// No unread data anywhere.
    pub fn is_empty(&self) -> bool {
        !self.direct.is_fresh()
            && self
                .connectors
                .read()
                .iter()
                .all(|c| c.buffer().readable() == 0)
    }

    fn notify_read(&self) {
        if let Some(callback) = self.on_read.read().as_ref() {
            callback();
        }
    }

    fn store(&self, value: T) {
        let value = match self.on_read_convert.read().as_ref() {
            Some(convert) => convert(&value),
            None => value,
        };
        *self.value.lock() = value;
        *self.status.lock() = DataPortStatus::PortOk;
    }

    fn read_connector(&self, connector: &dyn InPortConnector) -> bool {
        let mut data = ByteData::new();
        let status = connector.read(&mut data);
        if !status.is_ok() {
            log::trace!("[{}] read: {}", self.name, status);
            *self.status.lock() = status;
            return false;
        }
        match decode::<T>(&data) {
            Ok(value) => {
                self.store(value);
                true
            }
            Err(e) => {
                log::warn!("[{}] cannot decode {}: {}", self.name, T::type_name(), e);
                *self.status.lock() = DataPortStatus::PortError;
                false
            }
        }
    }

    // ---------------------------------------------------------------------
    // Callbacks
    // ---------------------------------------------------------------------

    /// Called at the start of every read.
    pub fn set_on_read(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_read.write() = Some(Box::new(callback));
    }

    /// Applied to every value before it becomes the port's value.
    pub fn set_on_read_convert(&self, convert: impl Fn(&T) -> T + Send + Sync + 'static) {
        *self.on_read_convert.write() = Some(Box::new(convert));
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    /// Attach `listener` to every current and future connector.
    pub fn add_data_listener(
        &self,
        kind: DataListenerKind,
        listener: Arc<dyn ConnectorDataListener>,
    ) -> PortListenerHandle {
        let (handle, attach) = self.listeners.add_data(kind, listener);
        for connector in self.connectors.read().iter() {
            attach(connector.events().listeners());
        }
        handle
    }

    pub fn add_listener(
        &self,
        kind: ListenerKind,
        listener: Arc<dyn ConnectorListener>,
    ) -> PortListenerHandle {
        let (handle, attach) = self.listeners.add_plain(kind, listener);
        for connector in self.connectors.read().iter() {
            attach(connector.events().listeners());
        }
        handle
    }

    pub fn add_data_fn<F>(&self, kind: DataListenerKind, callback: F) -> PortListenerHandle
    where
        F: Fn(&mut ConnectorInfo, &mut ByteData) -> ListenerReturn + Send + Sync + 'static,
    {
        self.add_data_listener(kind, Arc::new(ClosureDataListener::new(callback)))
    }

    pub fn add_fn<F>(&self, kind: ListenerKind, callback: F) -> PortListenerHandle
    where
        F: Fn(&mut ConnectorInfo) -> ListenerReturn + Send + Sync + 'static,
    {
        self.add_listener(kind, Arc::new(ClosureListener::new(callback)))
    }

    /// Withdraw a port-level registration from every connector.
    pub fn remove_listener(&self, handle: PortListenerHandle) -> bool {
        let Some(tag) = self.listeners.remove(handle) else {
            return false;
        };
        for connector in self.connectors.read().iter() {
            connector.events().listeners().remove_tagged(tag);
        }
        true
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    pub fn connectors(&self) -> Vec<Arc<dyn InPortConnector>> {
        self.connectors.read().clone()
    }

    pub fn connector(&self, id: &str) -> Option<Arc<dyn InPortConnector>> {
        self.find(|c| c.id() == id)
    }

    /// Ids of every connection, direct ones included.
    pub fn connector_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connectors.read().iter().map(|c| c.id()).collect();
        ids.extend(self.direct_links.read().iter().map(|l| l.info.id.clone()));
        ids
    }

    pub fn is_connected(&self, id: &str) -> bool {
        self.connector(id).is_some() || self.direct_links.read().iter().any(|l| l.info.id == id)
    }

    /// Tear down the connection `id` on this side.
    ///
    /// # Errors
    /// [`Error::ConnectorNotFound`] for an unknown id.
    pub fn disconnect(&self, id: &str) -> Result<()> {
        let removed = {
            let mut connectors = self.connectors.write();
            connectors
                .iter()
                .position(|c| c.id() == id)
                .map(|idx| connectors.remove(idx))
        };
        if let Some(connector) = removed {
            connector.disconnect();
            return Ok(());
        }

        let mut links = self.direct_links.write();
        match links.iter().position(|l| l.info.id == id) {
            Some(idx) => {
                links.remove(idx).close();
                Ok(())
            }
            None => Err(Error::ConnectorNotFound(id.to_string())),
        }
    }

    pub fn disconnect_all(&self) {
        let connectors: Vec<_> = self.connectors.write().drain(..).collect();
        for connector in connectors {
            connector.disconnect();
        }
        for link in self.direct_links.write().drain(..) {
            link.close();
        }
    }

    fn find(&self, pred: impl Fn(&dyn InPortConnector) -> bool) -> Option<Arc<dyn InPortConnector>> {
        self.connectors
            .read()
            .iter()
            .find(|c| pred(c.as_ref()))
            .cloned()
    }

    pub(crate) fn accepted_endians(&self) -> Vec<Endian> {
        endian_list(&self.properties).unwrap_or_default()
    }

    fn new_events(&self, profile: &ConnectorProfile, ports: &[String]) -> Arc<ConnectorEvents> {
        let mut props = self.properties.clone();
        props.merge(&profile.properties);
        let info = ConnectorInfo::new(&profile.name, &profile.id, ports.to_vec(), props);
        Arc::new(ConnectorEvents::new(
            info,
            Arc::new(self.listeners.instantiate()),
        ))
    }

    fn attach(&self, connector: Arc<dyn InPortConnector>) {
        connector.events().fire(ListenerKind::OnConnect);
        log::debug!("[{}] connector {} attached", self.name, connector.id());
        self.connectors.write().push(connector);
    }

    /// Push connection: build the provider side and describe it in `profile`.
    pub(crate) fn publish_interfaces(
        &self,
        profile: &mut ConnectorProfile,
        ports: &[String],
    ) -> Result<()> {
        let events = self.new_events(profile, ports);
        let props = events.info().properties.clone();
        let interface = profile.interface();

        let mut provider = self.runtime.inport_providers.create(&interface)?;
        provider.init(&props)?;
        let connector = InPortPushConnector::new(events, provider, self.shared.clone())?;
        if !connector.publish_interface(&mut profile.properties) {
            return Err(Error::PublicationFailed(format!(
                "{} provider of {}",
                interface, self.name
            )));
        }
        self.attach(connector);
        Ok(())
    }

    /// Pull connection: reach the OutPort provider described in `profile`.
    pub(crate) fn subscribe_interfaces(
        &self,
        profile: &ConnectorProfile,
        ports: &[String],
    ) -> Result<()> {
        let events = self.new_events(profile, ports);
        let props = events.info().properties.clone();
        let interface = profile.interface();

        let mut consumer = self.runtime.outport_consumers.create(&interface)?;
        consumer.init(&props)?;
        if !consumer.subscribe_interface(&props) {
            return Err(Error::SubscriptionFailed(format!(
                "{} consumer of {}",
                interface, self.name
            )));
        }
        let connector = InPortPullConnector::new(events, consumer)?;
        self.attach(Arc::new(connector));
        Ok(())
    }

    pub(crate) fn direct_slot(&self) -> &Arc<DirectSlot<T>> {
        &self.direct
    }

    pub(crate) fn attach_direct(&self, link: Arc<DirectLink<T>>) {
        log::debug!("[{}] direct link {} attached", self.name, link.info.id);
        self.direct_links.write().push(link);
    }
}

impl<T: PortData> Drop for InPort<T> {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}
