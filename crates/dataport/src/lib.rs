// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dataport - typed data ports with pluggable transports
//!
//! Component-style data ports: an [`OutPort`] writes typed values, one or
//! more [`InPort`]s read them. Between them sits a connector per connection,
//! with a bounded ring buffer, a publisher deciding when samples are pushed,
//! a transport moving the encoded bytes, and listeners observing every step.
//!
//! ## Quick Start
//!
//! ```rust
//! use dataport::{connect, ConnectorProfile, InPort, OutPort, Result, Runtime};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let runtime = Arc::new(Runtime::with_defaults());
//!     let out = OutPort::<f64>::builder("temperature").runtime(runtime.clone()).build()?;
//!     let inp = InPort::builder("display", 0.0f64).runtime(runtime).build()?;
//!
//!     connect(&out, &inp, ConnectorProfile::new("temp-link"))?;
//!
//!     out.write(&21.5);
//!     if inp.read() {
//!         assert_eq!(inp.value(), 21.5);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   OutPort<T>                                           InPort<T>    |
//! +---------------------------------------------------------------------+
//! |   OutPortConnector                              InPortConnector     |
//! |   Publisher (periodic/flush) | RingBuffer | ConnectorListeners      |
//! +---------------------------------------------------------------------+
//! |   Transport: InPortConsumer -> InPortProvider   (push)              |
//! |              OutPortConsumer -> OutPortProvider (pull)              |
//! |              local | udp | direct                                   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OutPort`] / [`InPort`] | Typed ports, entry point for applications |
//! | [`ConnectorProfile`] | Name, id and properties of a connection |
//! | [`Runtime`] | Registries of publishers, task backends and transports |
//! | [`RingBuffer`](buffer::RingBuffer) | Bounded FIFO with full/empty policies |
//! | [`PublisherPeriodic`](publisher::PublisherPeriodic) | Push policy engine (`all`, `fifo`, `skip`, `new`) |
//! | [`DataPortStatus`] | Outcome of every data-path operation |
//!
//! ## Modules Overview
//!
//! - [`port`] - ports and the connection protocol (start here)
//! - [`config`] - property keys and defaults
//! - [`buffer`] - ring buffer
//! - [`publisher`] - push policies
//! - [`listener`] - connector event listeners
//! - [`transport`] - provider/consumer traits and bundled transports
//! - [`task`] - periodic execution engine
//! - [`cdr`] - sample encoding
//! - [`logging`] - `log` backend with console and file outputs

pub mod buffer;
pub mod cdr;
pub mod config;
pub mod connector;
pub mod error;
pub mod listener;
pub mod logging;
pub mod port;
pub mod publisher;
pub mod runtime;
pub mod status;
pub mod task;
pub mod transport;

pub use cdr::{ByteData, Endian, PortData, SerError, TimedValue, Timestamp};
pub use connector::ConnectorInfo;
pub use error::{Error, Result};
pub use listener::{DataListenerKind, ListenerKind, ListenerReturn};
pub use port::{connect, disconnect, BufferMode, ConnectorProfile, InPort, OutPort};
pub use runtime::Runtime;
pub use status::{BufferStatus, DataPortStatus, DataPortStatusList};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
