// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-connector listener registry.

use super::{
    ClosureDataListener, ClosureListener, ConnectorDataListener, ConnectorListener,
    DataListenerKind, ListenerKind, ListenerReturn,
};
use crate::cdr::ByteData;
use crate::connector::ConnectorInfo;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

struct Entry<L: ?Sized> {
    id: u64,
    /// Port-level registration this entry was attached from.
    tag: Option<u64>,
    listener: Arc<L>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Data(DataListenerKind),
    Plain(ListenerKind),
}

/// Token returned by registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    id: u64,
    slot: Slot,
}

/// Listeners of one connector, grouped by event kind.
///
/// Callbacks of a kind run in registration order. Notification works on a
/// snapshot, so a callback may register or remove listeners without
/// deadlocking.
pub struct ConnectorListeners {
    data: [RwLock<Vec<Entry<dyn ConnectorDataListener>>>; DataListenerKind::COUNT],
    plain: [RwLock<Vec<Entry<dyn ConnectorListener>>>; ListenerKind::COUNT],
    data_fired: [AtomicU64; DataListenerKind::COUNT],
    plain_fired: [AtomicU64; ListenerKind::COUNT],
    next_id: AtomicU64,
}

impl Default for ConnectorListeners {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorListeners {
    pub fn new() -> Self {
        Self {
            data: std::array::from_fn(|_| RwLock::new(Vec::new())),
            plain: std::array::from_fn(|_| RwLock::new(Vec::new())),
            data_fired: std::array::from_fn(|_| AtomicU64::new(0)),
            plain_fired: std::array::from_fn(|_| AtomicU64::new(0)),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add_data_listener(
        &self,
        kind: DataListenerKind,
        listener: Arc<dyn ConnectorDataListener>,
    ) -> ListenerHandle {
        self.add_data_tagged(kind, listener, None)
    }

    pub fn add_listener(
        &self,
        kind: ListenerKind,
        listener: Arc<dyn ConnectorListener>,
    ) -> ListenerHandle {
        self.add_tagged(kind, listener, None)
    }

    pub fn add_data_fn<F>(&self, kind: DataListenerKind, callback: F) -> ListenerHandle
    where
        F: Fn(&mut ConnectorInfo, &mut ByteData) -> ListenerReturn + Send + Sync + 'static,
    {
        self.add_data_listener(kind, Arc::new(ClosureDataListener::new(callback)))
    }

    pub fn add_fn<F>(&self, kind: ListenerKind, callback: F) -> ListenerHandle
    where
        F: Fn(&mut ConnectorInfo) -> ListenerReturn + Send + Sync + 'static,
    {
        self.add_listener(kind, Arc::new(ClosureListener::new(callback)))
    }

    pub(crate) fn add_data_tagged(
        &self,
        kind: DataListenerKind,
        listener: Arc<dyn ConnectorDataListener>,
        tag: Option<u64>,
    ) -> ListenerHandle {
        let id = self.next_id();
        self.data[kind.index()]
            .write()
            .push(Entry { id, tag, listener });
        ListenerHandle {
            id,
            slot: Slot::Data(kind),
        }
    }

    pub(crate) fn add_tagged(
        &self,
        kind: ListenerKind,
        listener: Arc<dyn ConnectorListener>,
        tag: Option<u64>,
    ) -> ListenerHandle {
        let id = self.next_id();
        self.plain[kind.index()]
            .write()
            .push(Entry { id, tag, listener });
        ListenerHandle {
            id,
            slot: Slot::Plain(kind),
        }
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn remove(&self, handle: ListenerHandle) -> bool {
        match handle.slot {
            Slot::Data(kind) => {
                let mut list = self.data[kind.index()].write();
                let before = list.len();
                list.retain(|e| e.id != handle.id);
                list.len() != before
            }
            Slot::Plain(kind) => {
                let mut list = self.plain[kind.index()].write();
                let before = list.len();
                list.retain(|e| e.id != handle.id);
                list.len() != before
            }
        }
    }

    /// Remove every entry attached from the port-level registration `tag`.
    pub(crate) fn remove_tagged(&self, tag: u64) -> usize {
        let mut removed = 0;
        for list in &self.data {
            let mut list = list.write();
            let before = list.len();
            list.retain(|e| e.tag != Some(tag));
            removed += before - list.len();
        }
        for list in &self.plain {
            let mut list = list.write();
            let before = list.len();
            list.retain(|e| e.tag != Some(tag));
            removed += before - list.len();
        }
        removed
    }

    pub fn has_data_listeners(&self, kind: DataListenerKind) -> bool {
        !self.data[kind.index()].read().is_empty()
    }

    pub fn has_listeners(&self, kind: ListenerKind) -> bool {
        !self.plain[kind.index()].read().is_empty()
    }

    pub fn data_listener_count(&self, kind: DataListenerKind) -> usize {
        self.data[kind.index()].read().len()
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.plain[kind.index()].read().len()
    }

    /// Run every listener of `kind` in registration order.
    pub fn notify_data(
        &self,
        kind: DataListenerKind,
        info: &mut ConnectorInfo,
        data: &mut ByteData,
    ) -> ListenerReturn {
        self.count_data(kind);
        let snapshot: Vec<Arc<dyn ConnectorDataListener>> = self.data[kind.index()]
            .read()
            .iter()
            .map(|e| e.listener.clone())
            .collect();

        let mut ret = ListenerReturn::NoChange;
        for listener in snapshot {
            ret = ret.merge(listener.on_data(info, data));
            if ret == ListenerReturn::Stop {
                break;
            }
        }
        ret
    }

    pub fn notify(&self, kind: ListenerKind, info: &mut ConnectorInfo) -> ListenerReturn {
        self.count(kind);
        let snapshot: Vec<Arc<dyn ConnectorListener>> = self.plain[kind.index()]
            .read()
            .iter()
            .map(|e| e.listener.clone())
            .collect();

        let mut ret = ListenerReturn::NoChange;
        for listener in snapshot {
            ret = ret.merge(listener.on_event(info));
            if ret == ListenerReturn::Stop {
                break;
            }
        }
        ret
    }

    pub(crate) fn count_data(&self, kind: DataListenerKind) {
        self.data_fired[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count(&self, kind: ListenerKind) {
        self.plain_fired[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// How many times `kind` was raised, listeners or not.
    pub fn data_fired(&self, kind: DataListenerKind) -> u64 {
        self.data_fired[kind.index()].load(Ordering::Relaxed)
    }

    pub fn fired(&self, kind: ListenerKind) -> u64 {
        self.plain_fired[kind.index()].load(Ordering::Relaxed)
    }

    /// Drop every registration. Counters are kept.
    pub fn clear(&self) {
        for list in &self.data {
            list.write().clear();
        }
        for list in &self.plain {
            list.write().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_registration_order_and_removal() {
        let reg = ConnectorListeners::new();
        let trace = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<ListenerHandle> = (0..3)
            .map(|n| {
                let trace = trace.clone();
                reg.add_data_fn(DataListenerKind::OnSend, move |_, _| {
                    trace.lock().push(n);
                    ListenerReturn::NoChange
                })
            })
            .collect();

        let mut info = ConnectorInfo::default();
        let mut data = ByteData::new();
        reg.notify_data(DataListenerKind::OnSend, &mut info, &mut data);
        assert_eq!(*trace.lock(), vec![0, 1, 2]);

        assert!(reg.remove(handles[1]));
        assert!(!reg.remove(handles[1]));
        trace.lock().clear();
        reg.notify_data(DataListenerKind::OnSend, &mut info, &mut data);
        assert_eq!(*trace.lock(), vec![0, 2]);
        assert_eq!(reg.data_fired(DataListenerKind::OnSend), 2);
    }

    #[test]
    fn test_stop_halts_remaining_listeners() {
        let reg = ConnectorListeners::new();
        let calls = Arc::new(AtomicU64::new(0));

        reg.add_fn(ListenerKind::OnBufferEmpty, |_| ListenerReturn::Stop);
        let c = calls.clone();
        reg.add_fn(ListenerKind::OnBufferEmpty, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            ListenerReturn::NoChange
        });

        let mut info = ConnectorInfo::default();
        assert_eq!(
            reg.notify(ListenerKind::OnBufferEmpty, &mut info),
            ListenerReturn::Stop
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_changes_accumulate() {
        let reg = ConnectorListeners::new();
        reg.add_data_fn(DataListenerKind::OnReceived, |info, _| {
            info.name = "renamed".into();
            ListenerReturn::InfoChanged
        });
        reg.add_data_fn(DataListenerKind::OnReceived, |_, data| {
            data.write_data(&[7]);
            ListenerReturn::DataChanged
        });

        let mut info = ConnectorInfo::default();
        let mut data = ByteData::new();
        let ret = reg.notify_data(DataListenerKind::OnReceived, &mut info, &mut data);
        assert_eq!(ret, ListenerReturn::BothChanged);
        assert_eq!(info.name, "renamed");
        assert_eq!(data.as_slice(), &[7]);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let reg = Arc::new(ConnectorListeners::new());
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let reg2 = reg.clone();
        let slot2 = slot.clone();
        let handle = reg.add_fn(ListenerKind::OnConnect, move |_| {
            if let Some(h) = slot2.lock().take() {
                reg2.remove(h);
            }
            ListenerReturn::NoChange
        });
        *slot.lock() = Some(handle);

        let mut info = ConnectorInfo::default();
        reg.notify(ListenerKind::OnConnect, &mut info);
        assert_eq!(reg.listener_count(ListenerKind::OnConnect), 0);
    }

    #[test]
    fn test_tagged_removal() {
        let reg = ConnectorListeners::new();
        reg.add_tagged(
            ListenerKind::OnConnect,
            Arc::new(ClosureListener::new(|_: &mut ConnectorInfo| {
                ListenerReturn::NoChange
            })),
            Some(9),
        );
        reg.add_data_tagged(
            DataListenerKind::OnSend,
            Arc::new(ClosureDataListener::new(
                |_: &mut ConnectorInfo, _: &mut ByteData| ListenerReturn::NoChange,
            )),
            Some(9),
        );
        reg.add_fn(ListenerKind::OnConnect, |_| ListenerReturn::NoChange);
        assert_eq!(reg.remove_tagged(9), 2);
        assert_eq!(reg.listener_count(ListenerKind::OnConnect), 1);
    }
}
