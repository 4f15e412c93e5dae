// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed sending port.

use super::direct::DirectLink;
use super::listeners::{PortListenerHandle, PortListeners};
use super::{endian_list, ConnectorProfile};
use crate::cdr::{encode, ByteData, Endian, PortData};
use crate::config::{keys, Properties};
use crate::connector::{ConnectorInfo, OutPortConnector, OutPortPullConnector, OutPortPushConnector};
use crate::error::{Error, Result};
use crate::listener::{
    ClosureDataListener, ClosureListener, ConnectorDataListener, ConnectorEvents,
    ConnectorListener, DataListenerKind, ListenerKind, ListenerReturn,
};
use crate::runtime::Runtime;
use crate::status::{DataPortStatus, DataPortStatusList};
use parking_lot::{Mutex, RwLock};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type OnWrite<T> = Box<dyn Fn(&T) + Send + Sync>;
type OnWriteConvert<T> = Box<dyn Fn(&T) -> T + Send + Sync>;

/// Builder for [`OutPort`].
pub struct OutPortBuilder<T> {
    name: String,
    runtime: Option<Arc<Runtime>>,
    properties: Properties,
    _marker: PhantomData<fn(T)>,
}

impl<T: PortData> OutPortBuilder<T> {
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

    /// # Errors
    /// An endian list without a single known byte order.
    pub fn build(self) -> Result<OutPort<T>> {
        endian_list(&self.properties)?;
        Ok(OutPort::with_parts(
            self.name,
            self.runtime
                .unwrap_or_else(|| Arc::new(Runtime::with_defaults())),
            self.properties,
        ))
    }
}

/// Sends typed values to every connected [`InPort`](super::InPort).
///
/// A value is encoded at most once per byte order in use; direct
/// connections receive the value itself. A connector whose transport
/// reports `CONNECTION_LOST` is dropped from the port.
///
/// # Example
///
/// ```rust
/// use dataport::{connect, ConnectorProfile, InPort, OutPort, Runtime};
/// use std::sync::Arc;
///
/// let runtime = Arc::new(Runtime::with_defaults());
/// let out = OutPort::<i32>::builder("out").runtime(runtime.clone()).build().expect("port");
/// let inp = InPort::builder("in", 0i32).runtime(runtime).build().expect("port");
///
/// connect(&out, &inp, ConnectorProfile::new("link")).expect("connect");
/// assert!(out.write(&42));
/// assert!(inp.read());
/// assert_eq!(inp.value(), 42);
/// ```
pub struct OutPort<T: PortData> {
    name: String,
    runtime: Arc<Runtime>,
    properties: Properties,
    connectors: RwLock<Vec<Arc<dyn OutPortConnector>>>,
    direct_links: RwLock<Vec<Arc<DirectLink<T>>>>,
    listeners: PortListeners,
    statuses: Mutex<DataPortStatusList>,
    active: AtomicBool,
    on_write: RwLock<Option<OnWrite<T>>>,
    on_write_convert: RwLock<Option<OnWriteConvert<T>>>,
}

impl<T: PortData> OutPort<T> {
    pub fn builder(name: impl Into<String>) -> OutPortBuilder<T> {
        OutPortBuilder {
            name: name.into(),
            runtime: None,
            properties: Properties::new(),
            _marker: PhantomData,
        }
    }

    /// Port with default properties and its own default runtime.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(
            name.into(),
            Arc::new(Runtime::with_defaults()),
            Properties::new(),
        )
    }

    fn with_parts(name: String, runtime: Arc<Runtime>, properties: Properties) -> Self {
        Self {
            name,
            runtime,
            properties,
            connectors: RwLock::new(Vec::new()),
            direct_links: RwLock::new(Vec::new()),
            listeners: PortListeners::default(),
            statuses: Mutex::new(Vec::new()),
            active: AtomicBool::new(true),
            on_write: RwLock::new(None),
            on_write_convert: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    // ---------------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------------

    /// Send `value` on every connection. `true` when all of them accepted it.
    pub fn write(&self, value: &T) -> bool {
        if let Some(callback) = self.on_write.read().as_ref() {
            callback(value);
        }
        let converted = self
            .on_write_convert
            .read()
            .as_ref()
            .map(|convert| convert(value));
        let value = converted.as_ref().unwrap_or(value);

        self.direct_links.write().retain(|link| {
            let alive = link.deliver(value);
            if !alive {
                log::debug!("[{}] direct link {} closed", self.name, link.info.id);
            }
            alive
        });

        let connectors = self.connectors.read().clone();
        let mut encoded: [Option<ByteData>; 2] = [None, None];
        let mut statuses = Vec::with_capacity(connectors.len());
        let mut lost = Vec::new();
        let mut all_ok = true;

        for connector in &connectors {
            let endian = connector.endian();
            let slot = match endian {
                Endian::Little => 0,
                Endian::Big => 1,
            };
            if encoded[slot].is_none() {
                match encode(value, endian) {
                    Ok(data) => encoded[slot] = Some(data),
                    Err(e) => {
                        log::warn!("[{}] cannot encode {}: {}", self.name, T::type_name(), e);
                        statuses.push(DataPortStatus::PortError);
                        all_ok = false;
                        continue;
                    }
                }
            }
            let Some(data) = &encoded[slot] else {
                continue;
            };

            let status = connector.write(data);
            if status == DataPortStatus::ConnectionLost {
                lost.push(connector.id());
            }
            all_ok &= status.is_ok();
            statuses.push(status);
        }
        *self.statuses.lock() = statuses;

        for id in lost {
            log::warn!("[{}] connection {} lost, removing it", self.name, id);
            if let Some(connector) = self.take_connector(&id) {
                connector.disconnect();
            }
        }
        all_ok
    }

    /// Per-connector outcome of the last `write()`, in connector order.
    pub fn statuses(&self) -> DataPortStatusList {
        self.statuses.lock().clone()
    }

    // ---------------------------------------------------------------------
    // Callbacks
    // ---------------------------------------------------------------------

    /// Called with every value passed to `write()`.
    pub fn set_on_write(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        *self.on_write.write() = Some(Box::new(callback));
    }

    /// Replaces the written value before it is sent.
    pub fn set_on_write_convert(&self, convert: impl Fn(&T) -> T + Send + Sync + 'static) {
        *self.on_write_convert.write() = Some(Box::new(convert));
    }

    // ---------------------------------------------------------------------
    // Activation
    // ---------------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::Release);
        for connector in self.connectors.read().iter() {
            connector.activate();
        }
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        for connector in self.connectors.read().iter() {
            connector.deactivate();
        }
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

    pub fn connectors(&self) -> Vec<Arc<dyn OutPortConnector>> {
        self.connectors.read().clone()
    }

    pub fn connector(&self, id: &str) -> Option<Arc<dyn OutPortConnector>> {
        self.connectors.read().iter().find(|c| c.id() == id).cloned()
    }

    /// Ids of every connection, direct ones included.
    pub fn connector_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connectors.read().iter().map(|c| c.id()).collect();
        ids.extend(self.direct_links.read().iter().map(|l| l.info.id.clone()));
        ids
    }

    pub fn is_connected(&self, id: &str) -> bool {
        self.connector(id).is_some()
            || self
                .direct_links
                .read()
                .iter()
                .any(|l| l.info.id == id && l.is_alive())
    }

    /// Tear down the connection `id` on this side.
    ///
    /// # Errors
    /// [`Error::ConnectorNotFound`] for an unknown id.
    pub fn disconnect(&self, id: &str) -> Result<()> {
        if let Some(connector) = self.take_connector(id) {
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

    fn take_connector(&self, id: &str) -> Option<Arc<dyn OutPortConnector>> {
        let mut connectors = self.connectors.write();
        let idx = connectors.iter().position(|c| c.id() == id)?;
        Some(connectors.remove(idx))
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

    fn attach(&self, connector: Arc<dyn OutPortConnector>) {
        if self.is_active() {
            connector.activate();
        }
        connector.events().fire(ListenerKind::OnConnect);
        log::debug!("[{}] connector {} attached", self.name, connector.id());
        self.connectors.write().push(connector);
    }

    /// Pull connection: serve this port's buffer and describe it in `profile`.
    pub(crate) fn publish_interfaces(
        &self,
        profile: &mut ConnectorProfile,
        ports: &[String],
    ) -> Result<()> {
        let events = self.new_events(profile, ports);
        let props = events.info().properties.clone();
        let interface = profile.interface();

        let mut provider = self.runtime.outport_providers.create(&interface)?;
        provider.init(&props)?;
        let connector = OutPortPullConnector::new(events, provider, None)?;
        if !connector.publish_interface(&mut profile.properties) {
            return Err(Error::PublicationFailed(format!(
                "{} provider of {}",
                interface, self.name
            )));
        }
        self.attach(connector);
        Ok(())
    }

    /// Push connection: reach the InPort provider described in `profile`.
    pub(crate) fn subscribe_interfaces(
        &self,
        profile: &ConnectorProfile,
        ports: &[String],
    ) -> Result<()> {
        let events = self.new_events(profile, ports);
        let props = events.info().properties.clone();
        let interface = profile.interface();

        let mut consumer = self.runtime.inport_consumers.create(&interface)?;
        consumer.init(&props)?;
        if !consumer.subscribe_interface(&props) {
            return Err(Error::SubscriptionFailed(format!(
                "{} consumer of {}",
                interface, self.name
            )));
        }
        let connector = OutPortPushConnector::new(&self.runtime, events, consumer, None)?;
        self.attach(Arc::new(connector));
        Ok(())
    }

    pub(crate) fn attach_direct(&self, link: Arc<DirectLink<T>>) {
        log::debug!("[{}] direct link {} attached", self.name, link.info.id);
        self.direct_links.write().push(link);
    }
}

impl<T: PortData> Drop for OutPort<T> {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}
