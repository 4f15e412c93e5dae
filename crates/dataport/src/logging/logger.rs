// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide `log::Log` implementation.

use super::output::{LogLevel, Output};
use std::io;
use std::sync::{Arc, OnceLock};

static LOGGER: OnceLock<PortLogger> = OnceLock::new();

/// Forwards `log` records to a single [`Output`].
struct PortLogger {
    output: Arc<dyn Output>,
    level_filter: LogLevel,
}

impl log::Log for PortLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        LogLevel::from(metadata.level()) >= self.level_filter
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        // A failing sink must not take the caller down with it.
        let _ = self
            .output
            .write(LogLevel::from(record.level()), record.target(), &message);
    }

    fn flush(&self) {
        let _ = self.output.flush();
    }
}

/// Install `output` as the global `log` backend.
///
/// Only the first call has an effect. Later calls, and calls made after
/// another crate already installed a logger, are ignored.
///
/// # Example
/// ```rust
/// use dataport::logging::{init_logger, FileOutput, LogLevel};
/// use std::sync::Arc;
///
/// let dir = std::env::temp_dir().join("dataport-doc.log");
/// if let Ok(file) = FileOutput::new(&dir, LogLevel::Debug) {
///     init_logger(Arc::new(file), LogLevel::Debug);
/// }
/// ```
pub fn init_logger(output: Arc<dyn Output>, level: LogLevel) {
    let mut installed_now = false;
    let logger = LOGGER.get_or_init(|| {
        installed_now = true;
        PortLogger {
            output,
            level_filter: level,
        }
    });

    if installed_now && log::set_logger(logger).is_ok() {
        log::set_max_level(level.to_filter());
    }
}

/// Flush the installed output, if any.
///
/// # Errors
/// Returns the output's flush error.
pub fn flush_logger() -> io::Result<()> {
    match LOGGER.get() {
        Some(logger) => logger.output.flush(),
        None => Ok(()),
    }
}
