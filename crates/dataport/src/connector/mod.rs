// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connectors: one object per established connection.
//!
//! A connector bundles the identity of a connection ([`ConnectorInfo`]),
//! its negotiated byte order, its ring buffer, its listener registry and the
//! transport piece that moves bytes:
//!
//! | Connector | Side | Moves bytes with |
//! |-----------|------|------------------|
//! | [`OutPortPushConnector`] | OutPort | publisher + [`InPortConsumer`](crate::transport::InPortConsumer) |
//! | [`OutPortPullConnector`] | OutPort | [`OutPortProvider`](crate::transport::OutPortProvider) serving its buffer |
//! | [`InPortPushConnector`] | InPort | [`InPortProvider`](crate::transport::InPortProvider) writing into it |
//! | [`InPortPullConnector`] | InPort | [`OutPortConsumer`](crate::transport::OutPortConsumer) fetching on read |
//!
//! Connector read/write results are [`DataPortStatus`] values; buffer
//! statuses are translated here.

mod info;
mod inport_pull;
mod inport_push;
mod outport_pull;
mod outport_push;

pub use info::ConnectorInfo;
pub use inport_pull::InPortPullConnector;
pub use inport_push::InPortPushConnector;
pub use outport_pull::OutPortPullConnector;
pub use outport_push::OutPortPushConnector;

use crate::buffer::CdrBuffer;
use crate::cdr::{ByteData, Endian};
use crate::listener::ConnectorEvents;
use crate::status::{BufferStatus, DataPortStatus};
use std::sync::Arc;

/// InPort side of a connection.
pub trait InPortConnector: Send + Sync {
    /// Current info snapshot (listeners may have edited it).
    fn profile(&self) -> Arc<ConnectorInfo>;

    fn id(&self) -> String {
        self.profile().id.clone()
    }

    fn name(&self) -> String {
        self.profile().name.clone()
    }

    fn endian(&self) -> Endian;

    fn buffer(&self) -> &Arc<CdrBuffer>;

    fn events(&self) -> &Arc<ConnectorEvents>;

    /// Fetch the next sample for the port.
    fn read(&self, data: &mut ByteData) -> DataPortStatus;

    /// Store a received sample. Called by the provider.
    fn write(&self, data: ByteData) -> BufferStatus;

    fn activate(&self) {}

    fn deactivate(&self) {}

    /// Tear the connection down. Idempotent.
    fn disconnect(&self) -> DataPortStatus;
}

/// OutPort side of a connection.
pub trait OutPortConnector: Send + Sync {
    fn profile(&self) -> Arc<ConnectorInfo>;

    fn id(&self) -> String {
        self.profile().id.clone()
    }

    fn name(&self) -> String {
        self.profile().name.clone()
    }

    fn endian(&self) -> Endian;

    fn buffer(&self) -> &Arc<CdrBuffer>;

    fn events(&self) -> &Arc<ConnectorEvents>;

    /// Hand an encoded sample to the connection.
    fn write(&self, data: &ByteData) -> DataPortStatus;

    fn activate(&self) {}

    fn deactivate(&self) {}

    /// Tear the connection down. Idempotent.
    fn disconnect(&self) -> DataPortStatus;
}
