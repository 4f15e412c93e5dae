// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffered publisher drained by a periodic task.

use super::{send, write_status, PublisherBase, PushPolicy};
use crate::buffer::CdrBuffer;
use crate::cdr::ByteData;
use crate::config::{keys, Properties, DEFAULT_THREAD_TYPE};
use crate::listener::{ConnectorEvents, DataListenerKind, ListenerKind};
use crate::runtime::TaskFactory;
use crate::status::DataPortStatus;
use crate::task::PeriodicTaskBase;
use crate::transport::InPortConsumer;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct PushState {
    policy: PushPolicy,
    skip_count: usize,
    /// Samples still to skip before the next delivery.
    leftskip: usize,
    /// Set once `new` delivered; an empty buffer then re-sends the last sample.
    readback: bool,
}

/// State shared between the publisher and its task closure.
struct PeriodicCore {
    consumer: RwLock<Option<Arc<dyn InPortConsumer>>>,
    buffer: RwLock<Option<Arc<CdrBuffer>>>,
    events: RwLock<Option<Arc<ConnectorEvents>>>,
    /// Held for a whole delivery cycle.
    push: Mutex<PushState>,
    retcode: Mutex<DataPortStatus>,
    connection_lost: AtomicBool,
}

impl PeriodicCore {
    /// One delivery cycle.
    fn svc(&self) -> DataPortStatus {
        let (Some(consumer), Some(buffer), Some(events)) = (
            self.consumer.read().clone(),
            self.buffer.read().clone(),
            self.events.read().clone(),
        ) else {
            return DataPortStatus::PreconditionNotMet;
        };

        let mut push = self.push.lock();
        let ret = if buffer.empty() && !push.readback {
            events.fire(ListenerKind::OnBufferEmpty);
            events.fire(ListenerKind::OnSenderEmpty);
            DataPortStatus::BufferEmpty
        } else {
            let cycle = Cycle {
                consumer: consumer.as_ref(),
                buffer: &buffer,
                events: &events,
            };
            let policy = push.policy;
            match policy {
                PushPolicy::All => cycle.push_all(),
                PushPolicy::Fifo => cycle.push_fifo(),
                PushPolicy::Skip => cycle.push_skip(&mut push),
                PushPolicy::New => cycle.push_new(&mut push),
            }
        };
        drop(push);

        if ret == DataPortStatus::ConnectionLost {
            log::warn!("[{}] connection lost", events.info().id);
            self.connection_lost.store(true, Ordering::Release);
        }
        *self.retcode.lock() = ret;
        ret
    }
}

struct Cycle<'a> {
    consumer: &'a dyn InPortConsumer,
    buffer: &'a CdrBuffer,
    events: &'a ConnectorEvents,
}

impl Cycle<'_> {
    /// Send the oldest unread sample, consuming it only once delivered.
    fn deliver_current(&self) -> DataPortStatus {
        let Some((seq, mut data)) = self.buffer.get_tagged() else {
            return DataPortStatus::BufferError;
        };
        self.events
            .fire_data(DataListenerKind::OnBufferRead, &mut data);
        let ret = send(self.consumer, self.events, &mut data);
        if ret.is_ok() {
            self.buffer.commit_read(seq);
        } else if self.buffer.release_read(seq) {
            self.events
                .fire_data(DataListenerKind::OnBufferOverwrite, &mut data);
        }
        ret
    }

    fn push_all(&self) -> DataPortStatus {
        while self.buffer.readable() > 0 {
            let ret = self.deliver_current();
            if !ret.is_ok() {
                return ret;
            }
        }
        DataPortStatus::PortOk
    }

    fn push_fifo(&self) -> DataPortStatus {
        self.deliver_current()
    }

    fn push_skip(&self, push: &mut PushState) -> DataPortStatus {
        let mut readable = self.buffer.readable();
        while readable > 0 {
            if push.leftskip > 0 {
                self.buffer.advance_rptr(1);
                push.leftskip -= 1;
                readable -= 1;
                continue;
            }
            let ret = self.deliver_current();
            if !ret.is_ok() {
                return ret;
            }
            readable -= 1;
            push.leftskip = push.skip_count;
        }
        DataPortStatus::PortOk
    }

    fn push_new(&self, push: &mut PushState) -> DataPortStatus {
        push.readback = true;
        let readable = isize::try_from(self.buffer.readable()).unwrap_or(isize::MAX);
        if !self.buffer.advance_rptr(readable - 1).is_ok() {
            // Nothing was ever written.
            return DataPortStatus::BufferEmpty;
        }
        self.deliver_current()
    }
}

/// Publisher that queues samples in the connector buffer and sends them
/// from a periodic task at `publisher.push_rate` Hz.
///
/// `write()` never blocks on the consumer: it stores the sample, wakes the
/// task and reports the buffer outcome. A `CONNECTION_LOST` seen by the task
/// is sticky; later writes return it without buffering.
pub struct PublisherPeriodic {
    core: Arc<PeriodicCore>,
    tasks: Arc<TaskFactory>,
    task: Option<Box<dyn PeriodicTaskBase>>,
    active: AtomicBool,
}

impl PublisherPeriodic {
    /// `tasks` provides the backend named by `thread_type`.
    pub fn new(tasks: Arc<TaskFactory>) -> Self {
        Self {
            core: Arc::new(PeriodicCore {
                consumer: RwLock::new(None),
                buffer: RwLock::new(None),
                events: RwLock::new(None),
                push: Mutex::new(PushState {
                    policy: PushPolicy::New,
                    skip_count: 0,
                    leftskip: 0,
                    readback: false,
                }),
                retcode: Mutex::new(DataPortStatus::PortOk),
                connection_lost: AtomicBool::new(false),
            }),
            tasks,
            task: None,
            active: AtomicBool::new(false),
        }
    }

    pub fn push_policy(&self) -> PushPolicy {
        self.core.push.lock().policy
    }

    pub fn skip_count(&self) -> usize {
        self.core.push.lock().skip_count
    }

    /// Outcome of the last delivery cycle.
    pub fn last_status(&self) -> DataPortStatus {
        *self.core.retcode.lock()
    }

    /// The scheduling task, once `init` succeeded.
    pub fn task(&self) -> Option<&dyn PeriodicTaskBase> {
        self.task.as_deref()
    }

    /// Run one delivery cycle on the calling thread.
    pub fn push_once(&self) -> DataPortStatus {
        self.core.svc()
    }

    fn create_task(&mut self, props: &Properties) -> DataPortStatus {
        let thread_type = props.get_or(keys::THREAD_TYPE, DEFAULT_THREAD_TYPE);
        let task = match self.tasks.create(thread_type) {
            Ok(task) => task,
            Err(e) => {
                log::error!("task creation failed: {}", e);
                return DataPortStatus::InvalidArgs;
            }
        };

        let hz = props
            .get_parsed::<f64>(keys::PUSH_RATE)
            .or_else(|| props.get_parsed::<f64>(keys::PUSH_RATE_LEGACY));
        let Some(hz) = hz else {
            log::error!("{}/{} were not found", keys::PUSH_RATE, keys::PUSH_RATE_LEGACY);
            return DataPortStatus::InvalidArgs;
        };
        if !(hz.is_finite() && hz > 0.0) {
            log::error!("invalid push rate: {} Hz", hz);
            return DataPortStatus::InvalidArgs;
        }

        let core = Arc::clone(&self.core);
        task.set_task(Box::new(move || {
            core.svc();
        }));
        task.set_period(Duration::from_secs_f64(1.0 / hz));

        task.execution_measure(props.get_bool(keys::MEASURE_EXEC_TIME, true));
        if let Some(count) = props.get_parsed::<usize>(keys::MEASURE_EXEC_COUNT) {
            task.execution_measure_count(count);
        }
        task.periodic_measure(props.get_bool(keys::MEASURE_PERIOD_TIME, true));
        if let Some(count) = props.get_parsed::<usize>(keys::MEASURE_PERIOD_COUNT) {
            task.periodic_measure_count(count);
        }

        task.suspend();
        if let Err(e) = task.activate() {
            log::error!("task activation failed: {}", e);
            return DataPortStatus::PortError;
        }
        task.suspend();

        if let Some(old) = self.task.replace(task) {
            old.resume();
            old.finalize();
        }
        DataPortStatus::PortOk
    }
}

impl PublisherBase for PublisherPeriodic {
    fn init(&mut self, props: &Properties) -> DataPortStatus {
        let (policy, skip_count) = PushPolicy::from_properties(props);
        {
            let mut push = self.core.push.lock();
            push.policy = policy;
            push.skip_count = skip_count;
            push.leftskip = 0;
        }
        self.create_task(props)
    }

    fn set_consumer(&mut self, consumer: Arc<dyn InPortConsumer>) -> DataPortStatus {
        *self.core.consumer.write() = Some(consumer);
        DataPortStatus::PortOk
    }

    fn set_buffer(&mut self, buffer: Arc<CdrBuffer>) -> DataPortStatus {
        *self.core.buffer.write() = Some(buffer);
        DataPortStatus::PortOk
    }

    fn set_listener(&mut self, events: Arc<ConnectorEvents>) -> DataPortStatus {
        *self.core.events.write() = Some(events);
        DataPortStatus::PortOk
    }

    fn write(&self, data: &ByteData, timeout: Option<Duration>) -> DataPortStatus {
        let (Some(buffer), Some(events)) =
            (self.core.buffer.read().clone(), self.core.events.read().clone())
        else {
            return DataPortStatus::PreconditionNotMet;
        };
        if self.core.consumer.read().is_none() {
            return DataPortStatus::PreconditionNotMet;
        }

        if self.core.connection_lost.load(Ordering::Acquire) {
            log::debug!("write(): connection lost");
            return DataPortStatus::ConnectionLost;
        }

        let mut data = data.clone();
        if *self.core.retcode.lock() == DataPortStatus::SendFull {
            log::debug!("write(): InPort buffer is full");
            let (status, dropped) = buffer.write_report(data, timeout);
            if let Some(mut dropped) = dropped {
                events.fire_data(DataListenerKind::OnBufferOverwrite, &mut dropped);
            }
            if !status.is_ok() {
                log::debug!("write(): sample not buffered: {}", status);
            }
            return DataPortStatus::BufferFull;
        }

        events.fire_data(DataListenerKind::OnBufferWrite, &mut data);
        let (status, dropped) = buffer.write_report(data.clone(), timeout);
        if let Some(mut dropped) = dropped {
            events.fire_data(DataListenerKind::OnBufferOverwrite, &mut dropped);
        }
        if let Some(task) = &self.task {
            task.resume();
        }
        write_status(status, &events, &mut data)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn activate(&self) -> DataPortStatus {
        let Some(task) = &self.task else {
            return DataPortStatus::PreconditionNotMet;
        };
        if self.core.buffer.read().is_none() {
            return DataPortStatus::PreconditionNotMet;
        }
        self.active.store(true, Ordering::Release);
        task.resume();
        DataPortStatus::PortOk
    }

    fn deactivate(&self) -> DataPortStatus {
        let Some(task) = &self.task else {
            return DataPortStatus::PreconditionNotMet;
        };
        self.active.store(false, Ordering::Release);
        task.suspend();
        DataPortStatus::PortOk
    }
}

impl Drop for PublisherPeriodic {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.resume();
            task.finalize();
        }
    }
}
