//! Builder pattern for configuring loggers.
//!
//! This module provides a chainable alternative to passing option lists.
//!
//! # Example
//!
//! ```rust,no_run
//! // Console logger installed globally
//! slogger::builder()
//!     .with_level("debug")
//!     .with_color(true)
//!     .init()
//!     .expect("Failed to initialize logging");
//!
//! // Standalone file logger rotated every day
//! let logger = slogger::builder()
//!     .with_rotate_interval("1d")
//!     .with_max_backups(7)
//!     .build_file("/var/log/app.log")
//!     .expect("Failed to create file logger");
//! ```

use std::path::Path;

use crate::config::{self, LogOption, LoggerConfig};
use crate::global;
use crate::{Result, Slogger};

/// A builder for configuring loggers.
#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    /// Create a new LoggerBuilder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::new(),
        }
    }

    /// Create a LoggerBuilder from an existing configuration.
    pub fn from_config(config: LoggerConfig) -> Self {
        Self { config }
    }

    /// Apply a raw option.
    pub fn with_option(mut self, option: LogOption) -> Self {
        self.config.apply(option);
        self
    }

    /// Set the log level ("debug", "info", "warn", "error"; anything else is info).
    pub fn with_level(self, level: &str) -> Self {
        self.with_option(config::with_level(level))
    }

    /// Rotate by size; 0 selects the 100 MiB default.
    pub fn with_max_size(self, max_size: u64) -> Self {
        self.with_option(config::with_max_size(max_size))
    }

    pub fn with_rotate_interval(self, interval: &str) -> Self {
        self.with_option(config::with_rotate_interval(interval))
    }

    pub fn with_buffer_size(self, buffer_size: usize) -> Self {
        self.with_option(config::with_buffer_size(buffer_size))
    }

    pub fn with_max_backups(self, max_backups: usize) -> Self {
        self.with_option(config::with_max_backups(max_backups))
    }

    pub fn with_compress(self, compress: bool) -> Self {
        self.with_option(config::with_compress(compress))
    }

    pub fn with_time_format(self, format: &str) -> Self {
        self.with_option(config::with_time_format(format))
    }

    pub fn with_file_perm(self, perm: u32) -> Self {
        self.with_option(config::with_file_perm(perm))
    }

    pub fn with_print_after_init(self, enable: bool) -> Self {
        self.with_option(config::with_print_after_init(enable))
    }

    pub fn with_color(self, enable: bool) -> Self {
        self.with_option(config::with_color(enable))
    }

    pub fn with_caller_skip(self, skip: i64) -> Self {
        self.with_option(config::with_caller_skip(skip))
    }

    /// Get the current configuration without building anything.
    pub fn build(self) -> LoggerConfig {
        self.config
    }

    /// Build a stdout logger.
    pub fn build_stdout(self) -> Result<Slogger> {
        Slogger::stdout(self.config)
    }

    /// Build a file logger writing to `path`.
    pub fn build_file<P: AsRef<Path>>(self, path: P) -> Result<Slogger> {
        Slogger::file(path, self.config)
    }

    /// Install a stdout logger globally, subject to the one-time init guard.
    pub fn init(self) -> Result<()> {
        global::init(self.into_options())
    }

    /// Install a file logger globally, subject to the one-time init guard.
    pub fn init_file<P: AsRef<Path>>(self, path: P) -> Result<()> {
        global::init_file(path, self.into_options())
    }

    /// Restate the configuration as options so it can pass through `init`.
    fn into_options(self) -> Vec<LogOption> {
        let c = self.config;
        vec![
            LogOption::Level(c.level),
            LogOption::MaxSize(c.max_size),
            LogOption::RotateInterval(c.rotate_interval),
            LogOption::BufferSize(c.buffer_size),
            LogOption::MaxBackups(c.max_backups),
            LogOption::Compress(c.compress),
            LogOption::TimeFormat(c.time_format),
            LogOption::FilePerm(c.file_perm),
            LogOption::PrintAfterInit(c.print_after_init),
            LogOption::Color(c.color),
            LogOption::CallerSkip(c.caller_skip),
        ]
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
