// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event sink shared by the pieces of one connector.

use super::{ConnectorListeners, DataListenerKind, ListenerKind, ListenerReturn};
use crate::cdr::ByteData;
use crate::connector::ConnectorInfo;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Connector info plus its listener registry.
///
/// The connector, its publisher and its provider/consumer all raise events
/// through the same `ConnectorEvents`, so an info edit made by one listener
/// is seen by every later notification of the connection.
pub struct ConnectorEvents {
    info: ArcSwap<ConnectorInfo>,
    listeners: Arc<ConnectorListeners>,
}

impl ConnectorEvents {
    pub fn new(info: ConnectorInfo, listeners: Arc<ConnectorListeners>) -> Self {
        Self {
            info: ArcSwap::from_pointee(info),
            listeners,
        }
    }

    /// Current info snapshot.
    pub fn info(&self) -> Arc<ConnectorInfo> {
        self.info.load_full()
    }

    pub fn listeners(&self) -> &Arc<ConnectorListeners> {
        &self.listeners
    }

    /// Raise a data event. Cheap when nobody listens.
    pub fn fire_data(&self, kind: DataListenerKind, data: &mut ByteData) -> ListenerReturn {
        if !self.listeners.has_data_listeners(kind) {
            self.listeners.count_data(kind);
            return ListenerReturn::NoChange;
        }
        let current = self.info.load_full();
        let mut info = ConnectorInfo::clone(&current);
        let ret = self.listeners.notify_data(kind, &mut info, data);
        self.commit(&current, info);
        ret
    }

    /// Raise a plain event.
    pub fn fire(&self, kind: ListenerKind) -> ListenerReturn {
        if !self.listeners.has_listeners(kind) {
            self.listeners.count(kind);
            return ListenerReturn::NoChange;
        }
        let current = self.info.load_full();
        let mut info = ConnectorInfo::clone(&current);
        let ret = self.listeners.notify(kind, &mut info);
        self.commit(&current, info);
        ret
    }

    fn commit(&self, current: &Arc<ConnectorInfo>, edited: ConnectorInfo) {
        if edited != **current {
            log::debug!("[{}] connector info replaced by listener", current.id);
            self.info.store(Arc::new(edited));
        }
    }
}
