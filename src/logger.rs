//! The [`Logger`] facade and its `tracing`-backed implementation.

use std::fmt;
use std::io;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::{LogOption, LoggerConfig};
use crate::format::LineFormat;
use crate::rotation::parse_rotate_interval;
use crate::{Result, RotatingWriter, RotationPolicy, RotationTrigger};

/// Backups kept by a file logger when none are configured.
pub const DEFAULT_MAX_BACKUPS: usize = 12;

/// Mode of time-rotated log files: owner-only access.
pub const TIME_ROTATED_FILE_PERM: u32 = 0o700;

/// Five logging operations plus a raw byte sink.
///
/// Messages arrive pre-formatted; use [`format_args!`] or the crate's
/// `info!`/`warn!`/... macros to build them.
pub trait Logger: Send + Sync {
    #[track_caller]
    fn info(&self, args: fmt::Arguments<'_>);

    #[track_caller]
    fn error(&self, args: fmt::Arguments<'_>);

    #[track_caller]
    fn warn(&self, args: fmt::Arguments<'_>);

    #[track_caller]
    fn debug(&self, args: fmt::Arguments<'_>);

    /// Log at the highest severity. This never terminates the process.
    #[track_caller]
    fn fatal(&self, args: fmt::Arguments<'_>);

    /// Write raw bytes to the logger's file, bypassing formatting.
    ///
    /// Loggers without a file return `Ok(0)`.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
}

#[derive(Debug, Clone, Copy)]
enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// A [`Logger`] that owns a private `tracing` dispatcher.
///
/// Built by [`new_stdout_logger`] or [`new_file_logger`]; never changed after
/// construction.
#[derive(Debug)]
pub struct Slogger {
    dispatch: Dispatch,
    config: LoggerConfig,
    writer: Option<Arc<RotatingWriter>>,
}

/// Build a logger that writes to stdout.
pub fn new_stdout_logger<I>(options: I) -> Result<Slogger>
where
    I: IntoIterator<Item = LogOption>,
{
    Slogger::stdout(LoggerConfig::new().with_options(options))
}

/// Build a logger that writes to a rotating file at `path`.
///
/// A non-zero max size selects size rotation; otherwise a non-empty rotate
/// interval selects time rotation; otherwise output is discarded.
pub fn new_file_logger<P, I>(path: P, options: I) -> Result<Slogger>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = LogOption>,
{
    Slogger::file(path, LoggerConfig::new().with_options(options))
}

impl Slogger {
    /// Build a stdout logger from a resolved configuration.
    pub fn stdout(config: LoggerConfig) -> Result<Self> {
        let format = LineFormat::new(&config.time_format, config.color)?;
        let dispatch = build_dispatch(&config, format, io::stdout);

        Ok(Self {
            dispatch,
            config,
            writer: None,
        })
    }

    /// Build a file logger from a resolved configuration.
    pub fn file<P: AsRef<Path>>(path: P, mut config: LoggerConfig) -> Result<Self> {
        if config.max_backups == 0 {
            config.max_backups = DEFAULT_MAX_BACKUPS;
        }

        // Files never get ANSI escapes.
        let format = LineFormat::new(&config.time_format, false)?;

        let writer = match rotation_policy(&config)? {
            Some(policy) => Some(Arc::new(RotatingWriter::new(path.as_ref(), policy)?)),
            None => None,
        };
        let dispatch = match &writer {
            Some(writer) => build_dispatch(&config, format, Arc::clone(writer)),
            None => build_dispatch(&config, format, io::sink),
        };

        let logger = Self {
            dispatch,
            config,
            writer,
        };
        if logger.config.print_after_init {
            logger.print_config();
        }

        Ok(logger)
    }

    /// The resolved configuration.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Rotation policy of the attached file, if any.
    pub fn policy(&self) -> Option<&RotationPolicy> {
        self.writer.as_deref().map(RotatingWriter::policy)
    }

    /// Rotation trigger of the attached file, if any.
    pub fn rotation(&self) -> Option<RotationTrigger> {
        self.policy().map(|policy| policy.trigger)
    }

    /// Path of the active log file, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.writer.as_deref().map(RotatingWriter::path)
    }

    /// The dispatcher every event goes through.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Flush buffered file output.
    pub fn flush(&self) -> io::Result<()> {
        match &self.writer {
            Some(writer) => writer.flush_file(),
            None => Ok(()),
        }
    }

    fn print_config(&self) {
        let config = &self.config;
        self.info(format_args!("[logger] Level: {}", config.level));
        self.info(format_args!("[logger] Max Backups: {}", config.max_backups));
        self.info(format_args!("[logger] Max Size: {}", config.max_size));
        self.info(format_args!("[logger] Rotate Interval: {}", config.rotate_interval));
        self.info(format_args!("[logger] Compress: {}", config.compress));
        self.info(format_args!("[logger] Buffer Size: {}", config.buffer_size));
        self.info(format_args!("[logger] File Perm: {:o}", config.file_perm));
        self.info(format_args!("[logger] Time Format: {}", config.time_format));
        self.info(format_args!("[logger] Caller Skip: {}", config.caller_skip));
    }

    fn emit(&self, severity: Severity, location: &Location<'_>, args: fmt::Arguments<'_>) {
        let caller = format!("{}:{}", location.file(), location.line());
        let caller = caller.as_str();

        tracing::dispatcher::with_default(&self.dispatch, || match severity {
            Severity::Debug => tracing::debug!(caller, "{}", args),
            Severity::Info => tracing::info!(caller, "{}", args),
            Severity::Warn => tracing::warn!(caller, "{}", args),
            Severity::Error => tracing::error!(caller, "{}", args),
            Severity::Fatal => tracing::error!(caller, fatal = true, "{}", args),
        });
    }
}

impl Logger for Slogger {
    #[track_caller]
    fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Info, Location::caller(), args);
    }

    #[track_caller]
    fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Error, Location::caller(), args);
    }

    #[track_caller]
    fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Warn, Location::caller(), args);
    }

    #[track_caller]
    fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Debug, Location::caller(), args);
    }

    #[track_caller]
    fn fatal(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Fatal, Location::caller(), args);
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match &self.writer {
            Some(writer) => writer.write_bytes(buf),
            None => Ok(0),
        }
    }
}

/// Pick the file rotation for `config`. Size and time rotation never combine.
fn rotation_policy(config: &LoggerConfig) -> Result<Option<RotationPolicy>> {
    let (trigger, file_perm) = if config.max_size > 0 {
        (RotationTrigger::size(config.max_size), config.file_perm)
    } else if !config.rotate_interval.is_empty() {
        let interval = parse_rotate_interval(&config.rotate_interval)?;
        (RotationTrigger::time(interval), TIME_ROTATED_FILE_PERM)
    } else {
        return Ok(None);
    };

    Ok(Some(
        RotationPolicy::new(trigger)
            .with_max_backups(config.max_backups)
            .with_compress(config.compress)
            .with_buffer_size(config.buffer_size)
            .with_file_perm(file_perm),
    ))
}

fn build_dispatch<W>(config: &LoggerConfig, format: LineFormat, make_writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(config.level.as_filter())
        .with_writer(make_writer)
        .event_format(format)
        .finish();

    Dispatch::new(subscriber)
}
