// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listeners registered on a port rather than on one connector.
//!
//! A port keeps the registrations as templates and attaches them to every
//! connector it creates, tagged so they can be withdrawn again.

use crate::listener::{
    ConnectorDataListener, ConnectorListener, ConnectorListeners, DataListenerKind, ListenerKind,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Token returned by a port-level registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortListenerHandle(u64);

enum Template {
    Data(DataListenerKind, Arc<dyn ConnectorDataListener>),
    Plain(ListenerKind, Arc<dyn ConnectorListener>),
}

#[derive(Default)]
pub(crate) struct PortListeners {
    templates: RwLock<Vec<(u64, Template)>>,
    next_tag: AtomicU64,
}

impl PortListeners {
    fn push(&self, template: Template) -> PortListenerHandle {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        self.templates.write().push((tag, template));
        PortListenerHandle(tag)
    }

    /// Record a data listener; returns it for attaching to live connectors.
    pub(crate) fn add_data(
        &self,
        kind: DataListenerKind,
        listener: Arc<dyn ConnectorDataListener>,
    ) -> (PortListenerHandle, impl Fn(&ConnectorListeners)) {
        let handle = self.push(Template::Data(kind, Arc::clone(&listener)));
        let tag = handle.0;
        (handle, move |target: &ConnectorListeners| {
            target.add_data_tagged(kind, Arc::clone(&listener), Some(tag));
        })
    }

    pub(crate) fn add_plain(
        &self,
        kind: ListenerKind,
        listener: Arc<dyn ConnectorListener>,
    ) -> (PortListenerHandle, impl Fn(&ConnectorListeners)) {
        let handle = self.push(Template::Plain(kind, Arc::clone(&listener)));
        let tag = handle.0;
        (handle, move |target: &ConnectorListeners| {
            target.add_tagged(kind, Arc::clone(&listener), Some(tag));
        })
    }

    /// Forget a registration. Returns the tag to strip from connectors.
    pub(crate) fn remove(&self, handle: PortListenerHandle) -> Option<u64> {
        let mut templates = self.templates.write();
        let before = templates.len();
        templates.retain(|(tag, _)| *tag != handle.0);
        (templates.len() != before).then_some(handle.0)
    }

    /// Registry for a new connector, pre-filled with every template.
    pub(crate) fn instantiate(&self) -> ConnectorListeners {
        let listeners = ConnectorListeners::new();
        for (tag, template) in self.templates.read().iter() {
            match template {
                Template::Data(kind, l) => {
                    listeners.add_data_tagged(*kind, Arc::clone(l), Some(*tag));
                }
                Template::Plain(kind, l) => {
                    listeners.add_tagged(*kind, Arc::clone(l), Some(*tag));
                }
            }
        }
        listeners
    }
}
