// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Configuration constants and the flat property set.
//!
//! Every tunable of a connection (buffer sizing, push policy, transport,
//! dataflow) travels as a string key/value pair inside a [`Properties`]
//! set. Connector profiles copy their properties, so each connector keeps a
//! snapshot of what it was built with.
//!
//! # Example
//!
//! ```rust
//! use dataport::config::{keys, Properties};
//!
//! let props = Properties::new()
//!     .with(keys::BUFFER_LENGTH, "16")
//!     .with(keys::BUFFER_FULL_POLICY, "block")
//!     .with(keys::PUSH_POLICY, "fifo");
//!
//! let buffer = props.node("buffer");
//! assert_eq!(buffer.get("length"), Some("16"));
//! assert_eq!(props.get_parsed::<usize>(keys::BUFFER_LENGTH), Some(16));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// =======================================================================
// Defaults
// =======================================================================

/// Ring buffer capacity when `buffer.length` is absent.
pub const DEFAULT_BUFFER_LENGTH: usize = 8;

/// Blocking write/read timeout when `buffer.*.timeout` is absent.
pub const DEFAULT_BUFFER_TIMEOUT: Duration = Duration::from_secs(1);

/// Push rate suggested to callers building periodic profiles.
///
/// The periodic publisher itself requires an explicit rate.
pub const DEFAULT_PUSH_RATE_HZ: f64 = 100.0;

/// Statistics window for execution/period measurement.
pub const DEFAULT_MEASURE_COUNT: usize = 1000;

/// Task backend used when `thread_type` is absent.
pub const DEFAULT_THREAD_TYPE: &str = "default";

/// Push policy used when `publisher.push_policy` is absent.
pub const DEFAULT_PUSH_POLICY: &str = "new";

/// Dataflow used when `dataport.dataflow_type` is absent.
pub const DEFAULT_DATAFLOW_TYPE: &str = "push";

/// Subscription used when `dataport.subscription_type` is absent.
pub const DEFAULT_SUBSCRIPTION_TYPE: &str = "flush";

/// Transport used when `dataport.interface_type` is absent.
pub const DEFAULT_INTERFACE_TYPE: &str = "local";

/// Byte orders a port accepts when nothing is configured, in preference order.
pub const DEFAULT_ENDIAN: &str = "little,big";

/// Every configuration key understood by the crate.
pub mod keys {
    // Publisher
    pub const PUSH_POLICY: &str = "publisher.push_policy";
    pub const SKIP_COUNT: &str = "publisher.skip_count";
    pub const PUSH_RATE: &str = "publisher.push_rate";
    /// Accepted when `publisher.push_rate` is absent.
    pub const PUSH_RATE_LEGACY: &str = "push_rate";
    pub const THREAD_TYPE: &str = "thread_type";

    // Measurement
    pub const MEASURE_EXEC_TIME: &str = "measurement.exec_time";
    pub const MEASURE_PERIOD_TIME: &str = "measurement.period_time";
    pub const MEASURE_EXEC_COUNT: &str = "measurement.exec_count";
    pub const MEASURE_PERIOD_COUNT: &str = "measurement.period_count";

    // Buffer
    pub const BUFFER_LENGTH: &str = "buffer.length";
    pub const BUFFER_FULL_POLICY: &str = "buffer.write.full_policy";
    pub const BUFFER_WRITE_TIMEOUT: &str = "buffer.write.timeout";
    pub const BUFFER_EMPTY_POLICY: &str = "buffer.read.empty_policy";
    pub const BUFFER_READ_TIMEOUT: &str = "buffer.read.timeout";

    // Connection
    pub const INTERFACE_TYPE: &str = "dataport.interface_type";
    pub const DATAFLOW_TYPE: &str = "dataport.dataflow_type";
    pub const SUBSCRIPTION_TYPE: &str = "dataport.subscription_type";
    pub const SERIALIZER_ENDIAN: &str = "dataport.serializer.cdr.endian";
    pub const DATA_TYPE: &str = "dataport.data_type";

    // Transports
    pub const LOCAL_INPORT_REF: &str = "dataport.local.inport_ref";
    pub const LOCAL_OUTPORT_REF: &str = "dataport.local.outport_ref";
    pub const UDP_BIND_ADDRESS: &str = "dataport.udp.bind_address";
    pub const UDP_ADDRESS: &str = "dataport.udp.address";
}

/// Lower-case and trim a configuration value.
pub fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

/// Ordered string key/value set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert only when the key is absent.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Trimmed, lower-cased value or `default`.
    pub fn get_normalized(&self, key: &str, default: &str) -> String {
        normalize(self.get_or(key, default))
    }

    /// Parse a trimmed value. `None` when absent or unparsable.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Boolean flag accepting `enable`/`disable`, `yes`/`no`, `true`/`false`,
    /// `on`/`off` and `1`/`0`. Anything else yields `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(normalize).as_deref() {
            Some("enable" | "yes" | "true" | "on" | "1") => true,
            Some("disable" | "no" | "false" | "off" | "0") => false,
            _ => default,
        }
    }

    /// Timeout in (fractional) seconds.
    ///
    /// A negative value means "wait forever" and yields `Some(None)`.
    /// Absent or unparsable values yield `None`.
    pub fn get_timeout(&self, key: &str) -> Option<Option<Duration>> {
        let secs: f64 = self.get_parsed(key)?;
        if !secs.is_finite() {
            return None;
        }
        if secs < 0.0 {
            return Some(None);
        }
        Some(Some(Duration::from_secs_f64(secs)))
    }

    /// Comma separated list, trimmed, empty items dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All pairs whose key starts with `prefix`.
    pub fn search_prefix(&self, prefix: &str) -> Vec<(&str, &str)> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Sub-tree below `name.` with the prefix stripped.
    pub fn node(&self, name: &str) -> Properties {
        let prefix = format!("{}.", name);
        self.search_prefix(&prefix)
            .into_iter()
            .map(|(k, v)| (k[prefix.len()..].to_string(), v.to_string()))
            .collect()
    }

    /// Copy every entry of `other` into `self`, overriding duplicates.
    pub fn merge(&mut self, other: &Properties) {
        for (k, v) in other.iter() {
            self.entries.insert(k.to_string(), v.to_string());
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.entries {
            writeln!(f, "{}: {}", k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_strips_prefix_and_ignores_siblings() {
        let props = Properties::new()
            .with("buffer.length", "4")
            .with("buffer.write.full_policy", "block")
            .with("bufferx.length", "9")
            .with("publisher.push_policy", "all");

        let node = props.node("buffer");
        assert_eq!(node.len(), 2);
        assert_eq!(node.get("length"), Some("4"));
        assert_eq!(node.get("write.full_policy"), Some("block"));
        assert!(node.get("push_policy").is_none());
    }

    #[test]
    fn test_typed_getters() {
        let props = Properties::new()
            .with("a", " 12 ")
            .with("b", "abc")
            .with("flag", "ENABLE")
            .with("off", "no")
            .with("list", " little, ,BIG ");

        assert_eq!(props.get_parsed::<u32>("a"), Some(12));
        assert_eq!(props.get_parsed::<u32>("b"), None);
        assert_eq!(props.get_parsed::<u32>("missing"), None);
        assert!(props.get_bool("flag", false));
        assert!(!props.get_bool("off", true));
        assert!(props.get_bool("b", true));
        assert_eq!(props.get_list("list"), vec!["little", "BIG"]);
        assert_eq!(props.get_normalized("flag", "x"), "enable");
        assert_eq!(props.get_normalized("missing", " Fifo "), "fifo");
    }

    #[test]
    fn test_timeouts() {
        let props = Properties::new()
            .with("t", "0.25")
            .with("forever", "-1")
            .with("bad", "soon");
        assert_eq!(
            props.get_timeout("t"),
            Some(Some(Duration::from_millis(250)))
        );
        assert_eq!(props.get_timeout("forever"), Some(None));
        assert_eq!(props.get_timeout("bad"), None);
        assert_eq!(props.get_timeout("missing"), None);
    }

    #[test]
    fn test_merge_and_defaults() {
        let mut base = Properties::new().with("k1", "v1").with("k2", "v2");
        base.merge(&Properties::new().with("k2", "override").with("k3", "v3"));
        base.set_default("k1", "ignored");
        base.set_default("k4", "v4");

        assert_eq!(base.get("k1"), Some("v1"));
        assert_eq!(base.get("k2"), Some("override"));
        assert_eq!(base.get("k3"), Some("v3"));
        assert_eq!(base.get("k4"), Some("v4"));
        assert_eq!(base.search_prefix("k").len(), 4);
    }

    #[test]
    fn test_snapshot_semantics() {
        let original = Properties::new().with(keys::PUSH_POLICY, "fifo");
        let mut copy = original.clone();
        copy.set(keys::PUSH_POLICY, "all");
        assert_eq!(original.get(keys::PUSH_POLICY), Some("fifo"));
        assert_ne!(original, copy);
    }
}
