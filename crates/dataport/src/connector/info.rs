// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connector identity handed to listeners.

use crate::cdr::Endian;
use crate::config::{keys, Properties};

/// Name, id, port names and the property snapshot of one connection.
///
/// Listeners receive a mutable copy; a listener that edits it makes the
/// edit visible to every later notification on the same connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub name: String,
    pub id: String,
    pub ports: Vec<String>,
    pub properties: Properties,
}

impl ConnectorInfo {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        ports: Vec<String>,
        properties: Properties,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            ports,
            properties,
        }
    }

    /// Negotiated byte order (first entry of the endian key, little if unset).
    pub fn endian(&self) -> Endian {
        self.properties
            .get(keys::SERIALIZER_ENDIAN)
            .and_then(|v| Endian::parse_list(v).first().copied())
            .unwrap_or_default()
    }
}
