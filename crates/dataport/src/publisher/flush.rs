// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synchronous publisher: every write goes straight to the consumer.

use super::{send, PublisherBase};
use crate::buffer::CdrBuffer;
use crate::cdr::ByteData;
use crate::config::Properties;
use crate::listener::ConnectorEvents;
use crate::status::DataPortStatus;
use crate::transport::InPortConsumer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Publisher without a thread or a queue.
///
/// `write()` returns the consumer's answer, so a full receiver surfaces to
/// the writer as `SEND_FULL` immediately. The connector buffer is not used.
pub struct PublisherFlush {
    consumer: Option<Arc<dyn InPortConsumer>>,
    events: Option<Arc<ConnectorEvents>>,
    /// Serializes writes so samples reach the consumer in call order.
    retcode: Mutex<DataPortStatus>,
    active: AtomicBool,
}

impl PublisherFlush {
    pub fn new() -> Self {
        Self {
            consumer: None,
            events: None,
            retcode: Mutex::new(DataPortStatus::PortOk),
            active: AtomicBool::new(false),
        }
    }
}

impl Default for PublisherFlush {
    fn default() -> Self {
        Self::new()
    }
}

impl PublisherBase for PublisherFlush {
    fn init(&mut self, _props: &Properties) -> DataPortStatus {
        DataPortStatus::PortOk
    }

    fn set_consumer(&mut self, consumer: Arc<dyn InPortConsumer>) -> DataPortStatus {
        self.consumer = Some(consumer);
        DataPortStatus::PortOk
    }

    fn set_buffer(&mut self, _buffer: Arc<CdrBuffer>) -> DataPortStatus {
        DataPortStatus::PortOk
    }

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) -> DataPortStatus {
        self.events = Some(events);
        DataPortStatus::PortOk
    }

    fn write(&self, data: &ByteData, _timeout: Option<Duration>) -> DataPortStatus {
        let (Some(consumer), Some(events)) = (&self.consumer, &self.events) else {
            return DataPortStatus::PreconditionNotMet;
        };

        let mut retcode = self.retcode.lock();
        if *retcode == DataPortStatus::ConnectionLost {
            log::debug!("write(): connection lost");
            return DataPortStatus::ConnectionLost;
        }

        let mut data = data.clone();
        *retcode = send(consumer.as_ref(), events, &mut data);
        *retcode
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn activate(&self) -> DataPortStatus {
        self.active.store(true, Ordering::Release);
        DataPortStatus::PortOk
    }

    fn deactivate(&self) -> DataPortStatus {
        self.active.store(false, Ordering::Release);
        DataPortStatus::PortOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdr::Endian;
    use crate::connector::ConnectorInfo;
    use crate::error::Result;
    use crate::listener::{ConnectorListeners, DataListenerKind};

    struct Scripted(Mutex<Vec<DataPortStatus>>);

    impl InPortConsumer for Scripted {
        fn interface_type(&self) -> &str {
            "scripted"
        }
        fn init(&mut self, _props: &Properties) -> Result<()> {
            Ok(())
        }
        fn set_listener(&mut self, _events: Arc<ConnectorEvents>) {}
        fn subscribe_interface(&mut self, _props: &Properties) -> bool {
            true
        }
        fn unsubscribe_interface(&self, _props: &Properties) {}
        fn put(&self, _data: &ByteData) -> DataPortStatus {
            self.0.lock().pop().unwrap_or(DataPortStatus::PortOk)
        }
    }

    #[test]
    fn test_write_reports_consumer_answer() {
        let mut publisher = PublisherFlush::new();
        assert_eq!(
            publisher.write(&ByteData::new(), None),
            DataPortStatus::PreconditionNotMet
        );

        // Popped from the back: OK, SEND_FULL, then CONNECTION_LOST.
        let consumer = Arc::new(Scripted(Mutex::new(vec![
            DataPortStatus::ConnectionLost,
            DataPortStatus::SendFull,
            DataPortStatus::PortOk,
        ])));
        let events = Arc::new(ConnectorEvents::new(
            ConnectorInfo::default(),
            Arc::new(ConnectorListeners::new()),
        ));
        publisher.set_consumer(consumer);
        publisher.set_listener(events.clone());

        let data = ByteData::from_vec(vec![7], Endian::Little);
        assert_eq!(publisher.write(&data, None), DataPortStatus::PortOk);
        assert_eq!(publisher.write(&data, None), DataPortStatus::SendFull);
        assert_eq!(publisher.write(&data, None), DataPortStatus::ConnectionLost);
        assert_eq!(publisher.write(&data, None), DataPortStatus::ConnectionLost);

        let fired = events.listeners();
        assert_eq!(fired.data_fired(DataListenerKind::OnSend), 3);
        assert_eq!(fired.data_fired(DataListenerKind::OnReceived), 1);
        assert_eq!(fired.data_fired(DataListenerKind::OnReceiverFull), 1);
        assert_eq!(fired.data_fired(DataListenerKind::OnReceiverError), 1);
    }
}
