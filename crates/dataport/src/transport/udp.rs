// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datagram push transport.
//!
//! One encoded sample per datagram, no acknowledgement. The provider binds a
//! socket (`dataport.udp.bind_address`, default `127.0.0.1:0`), runs a receive
//! thread and publishes the bound address as `dataport.udp.address`. The
//! consumer sends to that address from an ephemeral socket.
//!
//! A send never reports the receiver's buffer state: the receiving side
//! raises its own buffer events when the datagram lands.

use super::{receive, InPortConsumer, InPortProvider};
use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::config::{keys, Properties};
use crate::connector::InPortConnector;
use crate::error::{Error, Result};
use crate::listener::ConnectorEvents;
use crate::status::DataPortStatus;
use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Interface type name of this transport.
pub const UDP_INTERFACE: &str = "udp";

/// Largest payload a single IPv4 datagram carries.
const MAX_DATAGRAM: usize = 65_507;

/// Receive poll interval; bounds shutdown latency.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:0";

/// Pause after a failed receive, doubled per consecutive failure.
const RECV_BACKOFF_MIN: Duration = Duration::from_millis(10);
const RECV_BACKOFF_MAX: Duration = Duration::from_millis(500);

fn recv_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(6);
    RECV_BACKOFF_MIN.saturating_mul(1 << shift).min(RECV_BACKOFF_MAX)
}

fn parse_addr(value: &str, key: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("{} '{}': {}", key, value, e)))
}

fn bind_socket(addr: SocketAddr, read_timeout: Option<Duration>) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_read_timeout(read_timeout)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

struct Receiver {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Receiving side: a bound socket plus a receive thread.
pub struct UdpInPortProvider {
    socket: Option<Arc<UdpSocket>>,
    connector: Option<Weak<dyn InPortConnector>>,
    events: Option<Arc<ConnectorEvents>>,
    receiver: Mutex<Option<Receiver>>,
}

impl UdpInPortProvider {
    pub fn new() -> Self {
        Self {
            socket: None,
            connector: None,
            events: None,
            receiver: Mutex::new(None),
        }
    }

    /// Address the socket is bound to, once `init` succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn spawn_receiver(&self, socket: Arc<UdpSocket>) -> io::Result<Receiver> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let connector = self.connector.clone();
        let events = self.events.clone();
        let name = format!(
            "dataport-udp-{}",
            socket.local_addr().map(|a| a.port()).unwrap_or_default()
        );

        let thread = thread::Builder::new().name(name).spawn(move || {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            let mut failures = 0u32;
            while !stop_flag.load(Ordering::Acquire) {
                match socket.recv_from(&mut buf) {
                    Ok((len, from)) => {
                        failures = 0;
                        log::trace!("[udp] {} bytes from {}", len, from);
                        let data = ByteData::from_vec(buf[..len].to_vec(), Endian::Little);
                        let status = receive(connector.as_ref(), events.as_ref(), data);
                        if !status.is_ok() {
                            log::debug!("[udp] datagram from {} not stored: {}", from, status);
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        ) =>
                    {
                        failures = 0;
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        if failures == 1 {
                            log::warn!("[udp] recv failed: {}", e);
                        } else {
                            log::debug!("[udp] recv failed ({} in a row): {}", failures, e);
                        }
                        thread::sleep(recv_backoff(failures));
                    }
                }
            }
        })?;

        Ok(Receiver {
            stop,
            thread: Some(thread),
        })
    }
}

impl Default for UdpInPortProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InPortProvider for UdpInPortProvider {
    fn interface_type(&self) -> &str {
        UDP_INTERFACE
    }

    fn init(&mut self, props: &Properties) -> Result<()> {
        let addr = parse_addr(
            props.get_or(keys::UDP_BIND_ADDRESS, DEFAULT_BIND_ADDRESS),
            keys::UDP_BIND_ADDRESS,
        )?;
        let socket = bind_socket(addr, Some(RECV_TIMEOUT))?;
        log::debug!("[udp] provider bound to {:?}", socket.local_addr().ok());
        self.socket = Some(Arc::new(socket));
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
        let Some(socket) = self.socket.clone() else {
            log::warn!("[udp] provider published before init");
            return false;
        };
        let Ok(addr) = socket.local_addr() else {
            return false;
        };

        let mut receiver = self.receiver.lock();
        if receiver.is_none() {
            match self.spawn_receiver(socket) {
                Ok(r) => *receiver = Some(r),
                Err(e) => {
                    log::warn!("[udp] cannot start receive thread: {}", e);
                    return false;
                }
            }
        }
        props.set(keys::UDP_ADDRESS, addr.to_string());
        true
    }

    fn put(&self, data: ByteData) -> DataPortStatus {
        receive(self.connector.as_ref(), self.events.as_ref(), data)
    }
}

impl Drop for UdpInPortProvider {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.lock().take() {
            receiver.stop.store(true, Ordering::Release);
            if let Some(handle) = receiver.thread.take() {
                if handle.join().is_err() {
                    log::warn!("[udp] receive thread panicked");
                }
            }
        }
    }
}

/// Sending side: an ephemeral socket aimed at a provider.
pub struct UdpInPortConsumer {
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
}

impl UdpInPortConsumer {
    pub fn new() -> Self {
        Self {
            socket: None,
            target: None,
        }
    }
}

impl Default for UdpInPortConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl InPortConsumer for UdpInPortConsumer {
    fn interface_type(&self) -> &str {
        UDP_INTERFACE
    }

    fn init(&mut self, _props: &Properties) -> Result<()> {
        Ok(())
    }

    // Nothing is raised here: a datagram send has no remote outcome.
    fn set_listener(&mut self, _events: Arc<ConnectorEvents>) {}

    fn subscribe_interface(&mut self, props: &Properties) -> bool {
        let Some(value) = props.get(keys::UDP_ADDRESS) else {
            log::warn!("[udp] profile has no {}", keys::UDP_ADDRESS);
            return false;
        };
        let target = match parse_addr(value, keys::UDP_ADDRESS) {
            Ok(addr) => addr,
            Err(e) => {
                log::warn!("[udp] {}", e);
                return false;
            }
        };
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        match bind_socket(local, None) {
            Ok(socket) => {
                self.socket = Some(socket);
                self.target = Some(target);
                true
            }
            Err(e) => {
                log::warn!("[udp] cannot bind sender socket: {}", e);
                false
            }
        }
    }

    fn unsubscribe_interface(&self, _props: &Properties) {}

    fn put(&self, data: &ByteData) -> DataPortStatus {
        let (Some(socket), Some(target)) = (&self.socket, self.target) else {
            return DataPortStatus::ConnectionLost;
        };
        if data.len() > MAX_DATAGRAM {
            log::warn!("[udp] sample of {} bytes exceeds one datagram", data.len());
            return DataPortStatus::PortError;
        }
        match socket.send_to(data.as_slice(), target) {
            Ok(_) => DataPortStatus::PortOk,
            Err(e) => match e.kind() {
                io::ErrorKind::ConnectionRefused => DataPortStatus::ConnectionLost,
                io::ErrorKind::WouldBlock => DataPortStatus::SendFull,
                _ => {
                    log::debug!("[udp] send to {} failed: {}", target, e);
                    DataPortStatus::PortError
                }
            },
        }
    }
}
