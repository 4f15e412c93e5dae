// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection request handed to [`connect`](super::connect).

use crate::config::{
    keys, Properties, DEFAULT_DATAFLOW_TYPE, DEFAULT_INTERFACE_TYPE, DEFAULT_SUBSCRIPTION_TYPE,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id() -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default();
    format!("{:x}-{}", stamp, NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Name, id and properties of a connection.
///
/// The id is generated when not given and is unique within the process.
///
/// # Example
///
/// ```rust
/// use dataport::config::keys;
/// use dataport::ConnectorProfile;
///
/// let profile = ConnectorProfile::new("sensor->logger")
///     .subscription_type("periodic")
///     .push_policy("fifo")
///     .push_rate(1000.0)
///     .property(keys::BUFFER_LENGTH, "4");
/// assert_eq!(profile.properties.get(keys::PUSH_RATE), Some("1000"));
/// assert!(!profile.id.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorProfile {
    pub name: String,
    pub id: String,
    pub properties: Properties,
}

impl ConnectorProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: generate_id(),
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }

    #[must_use]
    pub fn properties(mut self, props: &Properties) -> Self {
        self.properties.merge(props);
        self
    }

    /// `local`, `udp` or `direct`.
    #[must_use]
    pub fn interface_type(self, value: &str) -> Self {
        self.property(keys::INTERFACE_TYPE, value)
    }

    /// `push` or `pull`.
    #[must_use]
    pub fn dataflow_type(self, value: &str) -> Self {
        self.property(keys::DATAFLOW_TYPE, value)
    }

    /// Publisher name, `flush` or `periodic`.
    #[must_use]
    pub fn subscription_type(self, value: &str) -> Self {
        self.property(keys::SUBSCRIPTION_TYPE, value)
    }

    #[must_use]
    pub fn push_policy(self, value: &str) -> Self {
        self.property(keys::PUSH_POLICY, value)
    }

    #[must_use]
    pub fn push_rate(self, hz: f64) -> Self {
        self.property(keys::PUSH_RATE, hz.to_string())
    }

    pub fn interface(&self) -> String {
        self.properties
            .get_normalized(keys::INTERFACE_TYPE, DEFAULT_INTERFACE_TYPE)
    }

    pub fn dataflow(&self) -> String {
        self.properties
            .get_normalized(keys::DATAFLOW_TYPE, DEFAULT_DATAFLOW_TYPE)
    }

    /// Fill the connection keys left unset.
    pub(crate) fn fill_defaults(&mut self) {
        self.properties
            .set_default(keys::INTERFACE_TYPE, DEFAULT_INTERFACE_TYPE);
        self.properties
            .set_default(keys::DATAFLOW_TYPE, DEFAULT_DATAFLOW_TYPE);
        self.properties
            .set_default(keys::SUBSCRIPTION_TYPE, DEFAULT_SUBSCRIPTION_TYPE);
    }
}
