// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffer policies and construction parameters.

use crate::config::{self, keys, Properties};
use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// What a write does when the buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullPolicy {
    /// Drop the oldest unread sample and store the new one.
    #[default]
    Overwrite,
    /// Return `Full` immediately.
    DoNothing,
    /// Wait for space up to the write timeout.
    Block,
}

impl FromStr for FullPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match config::normalize(s).as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "do_nothing" => Ok(Self::DoNothing),
            "block" => Ok(Self::Block),
            other => Err(Error::InvalidConfig(format!(
                "unknown buffer.write.full_policy '{}'",
                other
            ))),
        }
    }
}

/// What a read does when the buffer is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPolicy {
    /// Return the most recently read sample again.
    #[default]
    Readback,
    /// Return `Empty` immediately.
    DoNothing,
    /// Wait for data up to the read timeout.
    Block,
}

impl FromStr for EmptyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match config::normalize(s).as_str() {
            "readback" => Ok(Self::Readback),
            "do_nothing" => Ok(Self::DoNothing),
            "block" => Ok(Self::Block),
            other => Err(Error::InvalidConfig(format!(
                "unknown buffer.read.empty_policy '{}'",
                other
            ))),
        }
    }
}

/// Ring buffer construction parameters.
///
/// Timeouts of `None` wait indefinitely under the `Block` policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    pub length: usize,
    pub full_policy: FullPolicy,
    pub write_timeout: Option<Duration>,
    pub empty_policy: EmptyPolicy,
    pub read_timeout: Option<Duration>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            length: config::DEFAULT_BUFFER_LENGTH,
            full_policy: FullPolicy::default(),
            write_timeout: Some(config::DEFAULT_BUFFER_TIMEOUT),
            empty_policy: EmptyPolicy::default(),
            read_timeout: Some(config::DEFAULT_BUFFER_TIMEOUT),
        }
    }
}

impl BufferConfig {
    pub fn with_length(length: usize) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn full_policy(mut self, policy: FullPolicy) -> Self {
        self.full_policy = policy;
        self
    }

    #[must_use]
    pub fn empty_policy(mut self, policy: EmptyPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    #[must_use]
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    #[must_use]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Read the `buffer.*` keys of a connector profile.
    ///
    /// Unknown policy names and unparsable timeouts keep the default and log
    /// a warning; a zero or unparsable length is rejected.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] for a bad `buffer.length`.
    pub fn from_properties(props: &Properties) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(raw) = props.get(keys::BUFFER_LENGTH) {
            match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(Error::InvalidConfig(format!(
                        "buffer.length must be a positive integer, got '{}'",
                        raw
                    )))
                }
                Ok(n) => cfg.length = n,
            }
        }

        if let Some(raw) = props.get(keys::BUFFER_FULL_POLICY) {
            match raw.parse() {
                Ok(policy) => cfg.full_policy = policy,
                Err(e) => log::warn!("{}; keeping {:?}", e, cfg.full_policy),
            }
        }
        if let Some(raw) = props.get(keys::BUFFER_EMPTY_POLICY) {
            match raw.parse() {
                Ok(policy) => cfg.empty_policy = policy,
                Err(e) => log::warn!("{}; keeping {:?}", e, cfg.empty_policy),
            }
        }

        if props.contains(keys::BUFFER_WRITE_TIMEOUT) {
            match props.get_timeout(keys::BUFFER_WRITE_TIMEOUT) {
                Some(t) => cfg.write_timeout = t,
                None => log::warn!("invalid buffer.write.timeout, keeping default"),
            }
        }
        if props.contains(keys::BUFFER_READ_TIMEOUT) {
            match props.get_timeout(keys::BUFFER_READ_TIMEOUT) {
                Some(t) => cfg.read_timeout = t,
                None => log::warn!("invalid buffer.read.timeout, keeping default"),
            }
        }

        Ok(cfg)
    }
}
