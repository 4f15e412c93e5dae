// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Push policies of the periodic publisher.

use crate::config::{keys, normalize, Properties, DEFAULT_PUSH_POLICY};
use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Which buffered samples one delivery tick sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushPolicy {
    /// Every readable sample, oldest first.
    All,
    /// The oldest readable sample.
    Fifo,
    /// One sample, then `skip_count` skipped, carried across ticks.
    Skip,
    /// The newest sample; older unread ones are discarded.
    #[default]
    New,
}

impl PushPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Fifo => "fifo",
            Self::Skip => "skip",
            Self::New => "new",
        }
    }

    /// Policy and skip count from `publisher.push_policy` and
    /// `publisher.skip_count`. Invalid values fall back to the defaults.
    pub fn from_properties(props: &Properties) -> (Self, usize) {
        let raw = props.get_normalized(keys::PUSH_POLICY, DEFAULT_PUSH_POLICY);
        let policy = raw.parse().unwrap_or_else(|e| {
            log::error!("{}", e);
            Self::New
        });

        let skip_count = match props.get(keys::SKIP_COUNT) {
            None => 0,
            Some(v) => v.trim().parse::<usize>().unwrap_or_else(|_| {
                log::error!("invalid skip_count value: {}", v);
                0
            }),
        };
        log::debug!("push_policy: {}, skip_count: {}", policy, skip_count);
        (policy, skip_count)
    }
}

impl FromStr for PushPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "all" => Ok(Self::All),
            "fifo" => Ok(Self::Fifo),
            "skip" => Ok(Self::Skip),
            "new" => Ok(Self::New),
            other => Err(Error::InvalidConfig(format!(
                "invalid push_policy value: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for PushPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
