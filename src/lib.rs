//! # Slogger
//!
//! A small logger facade on top of `tracing`.
//!
//! ## Features
//!
//! - `Logger` trait with info/error/warn/debug/fatal and a raw byte sink
//! - Console output or log files rotated by size or by time interval
//! - Gzip-compressed backups with bounded retention
//! - A process-wide logger with lazy default and one-time init
//! - A query logger for ORMs with slow-query reporting
//!
//! ## Example
//!
//! ```rust
//! use slogger::{Logger, new_stdout_logger, with_level};
//!
//! let logger = new_stdout_logger([with_level("debug")])?;
//! logger.info(format_args!("This is an info message"));
//!
//! slogger::init([with_level("info")])?;
//! slogger::warn!("disk usage at {}%", 91);
//! # Ok::<(), slogger::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod format;
pub mod global;
pub mod logger;
pub mod orm;
pub mod rotation;
pub mod tracing_init;
pub mod writer;

pub use builder::LoggerBuilder;
pub use config::{
    Level, LogOption, LoggerConfig, with_buffer_size, with_caller_skip, with_color, with_compress,
    with_file_perm, with_level, with_max_backups, with_max_size, with_print_after_init,
    with_rotate_interval, with_time_format,
};
pub use error::{Error, Result};
pub use global::{get_logger, init, init_file, set_logger, write};
pub use logger::{Logger, Slogger, new_file_logger, new_stdout_logger};
pub use rotation::{RotationPolicy, RotationTrigger, parse_rotate_interval};
pub use tracing_init::init_tracing;
pub use writer::RotatingWriter;

/// Start a [`LoggerBuilder`] with default configuration.
pub fn builder() -> LoggerBuilder {
    LoggerBuilder::new()
}
