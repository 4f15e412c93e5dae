// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging backend for the `log` facade.
//!
//! Library code only emits records through `log::debug!`, `log::warn!` and
//! friends; nothing is printed until an application installs a backend. This
//! module provides a small one:
//!
//! - [`ConsoleOutput`] writes to stderr
//! - [`FileOutput`] truncates and appends to a file
//! - [`init_logger`] installs either as the process-wide `log::Log`
//!
//! Applications already using another `log` backend (env_logger, tracing-log,
//! ...) can ignore this module entirely.
//!
//! ## Example
//!
//! ```rust
//! use dataport::logging::{init_logger, ConsoleOutput, LogLevel};
//! use std::sync::Arc;
//!
//! init_logger(Arc::new(ConsoleOutput::new(LogLevel::Info)), LogLevel::Info);
//! log::info!("publisher started");
//! ```

mod logger;
mod output;

pub use logger::{flush_logger, init_logger};
pub use output::{ConsoleOutput, FileOutput, LogLevel, Output};
