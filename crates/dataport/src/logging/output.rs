// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output destinations for log records.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Severity used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Detailed development information (also receives `log::Level::Trace`)
    Debug = 0,
    /// Normal operation
    Info = 1,
    /// Potentially harmful situations
    Warning = 2,
    /// Error conditions
    Error = 3,
}

impl LogLevel {
    /// Fixed-width label used as line prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warning => "WARN ",
            Self::Error => "ERROR",
        }
    }

    /// Equivalent `log` crate filter.
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            Self::Debug => log::LevelFilter::Trace,
            Self::Info => log::LevelFilter::Info,
            Self::Warning => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Self::Debug,
            log::Level::Info => Self::Info,
            log::Level::Warn => Self::Warning,
            log::Level::Error => Self::Error,
        }
    }
}

/// Destination for formatted log lines.
///
/// Implementations must be thread-safe; records arrive from publisher
/// threads, UDP receivers and application threads concurrently.
pub trait Output: Send + Sync {
    /// Write one record. `target` is the emitting module path.
    fn write(&self, level: LogLevel, target: &str, message: &str) -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&self) -> io::Result<()>;
}

/// Writes `[LEVEL] target: message` lines to stderr.
pub struct ConsoleOutput {
    level_filter: LogLevel,
}

impl ConsoleOutput {
    pub fn new(level_filter: LogLevel) -> Self {
        Self { level_filter }
    }
}

impl Output for ConsoleOutput {
    fn write(&self, level: LogLevel, target: &str, message: &str) -> io::Result<()> {
        if level < self.level_filter {
            return Ok(());
        }
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "[{}] {}: {}", level.as_str(), target, message)
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Appends log lines to a file, truncated on creation.
pub struct FileOutput {
    file: Mutex<File>,
    level_filter: LogLevel,
}

impl FileOutput {
    /// Create (or truncate) the log file at `path`.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>, level_filter: LogLevel) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
            level_filter,
        })
    }
}

impl Output for FileOutput {
    fn write(&self, level: LogLevel, target: &str, message: &str) -> io::Result<()> {
        if level < self.level_filter {
            return Ok(());
        }
        let mut file = self.file.lock();
        writeln!(file, "[{}] {}: {}", level.as_str(), target, message)
    }

    fn flush(&self) -> io::Result<()> {
        self.file.lock().flush()
    }
}
