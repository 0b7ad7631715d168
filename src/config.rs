use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rotation::{deserialize_buffer_size, deserialize_size};

/// Default time format, `2006-01-02 15:04:05` style.
pub const DEFAULT_TIME_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// Size used when `with_max_size(0)` is requested.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

/// Minimum severity a logger lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a level name, falling back to [`Level::Info`] for anything unknown.
    pub fn parse_lossy(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub(crate) fn as_filter(&self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;

        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

impl From<String> for Level {
    fn from(level: String) -> Self {
        Self::parse_lossy(&level)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration of a logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level written.
    pub level: Level,
    /// Size in bytes that triggers rotation; 0 disables size rotation.
    /// Accepts a number of bytes or a string with a K/M/G unit.
    #[serde(deserialize_with = "deserialize_size")]
    pub max_size: u64,
    /// Rotated files to keep.
    pub max_backups: usize,
    /// Write buffer in bytes; 0 writes synchronously.
    #[serde(deserialize_with = "deserialize_buffer_size")]
    pub buffer_size: usize,
    /// Time rotation interval such as `12h`, `1d` or `1w`; empty disables it.
    pub rotate_interval: String,
    /// Gzip rotated files.
    pub compress: bool,
    /// Unix mode of created log files.
    pub file_perm: u32,
    /// `time` format description for the timestamp column.
    pub time_format: String,
    /// Stack frames to skip when attributing a caller. Facade calls resolve
    /// their caller through `#[track_caller]`, which already lands outside
    /// this crate, so the value is only reported.
    pub caller_skip: usize,
    /// Color the level column.
    pub color: bool,
    /// Log the configuration once a file logger is built.
    pub print_after_init: bool,
}

impl LoggerConfig {
    /// Create a LoggerConfig with defaults
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            max_size: 0,
            max_backups: 0,
            buffer_size: 0,
            rotate_interval: "1w".to_string(),
            compress: true,
            file_perm: 0o700,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            caller_skip: 0,
            color: false,
            print_after_init: false,
        }
    }

    /// Apply a single option.
    pub fn apply(&mut self, option: LogOption) {
        match option {
            LogOption::Level(level) => self.level = level,
            LogOption::MaxSize(max_size) => self.max_size = max_size,
            LogOption::RotateInterval(interval) => self.rotate_interval = interval,
            LogOption::BufferSize(buffer_size) => self.buffer_size = buffer_size,
            LogOption::MaxBackups(max_backups) => self.max_backups = max_backups,
            LogOption::Compress(compress) => self.compress = compress,
            LogOption::TimeFormat(format) => self.time_format = format,
            LogOption::FilePerm(perm) => self.file_perm = perm,
            LogOption::PrintAfterInit(enable) => self.print_after_init = enable,
            LogOption::Color(enable) => self.color = enable,
            LogOption::CallerSkip(skip) => self.caller_skip = skip,
        }
    }

    /// Apply options in order on top of `self`; later options win.
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = LogOption>,
    {
        for option in options {
            self.apply(option);
        }
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One named configuration change, produced by the `with_*` functions.
///
/// Values are already normalized, so applying an option never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOption {
    Level(Level),
    MaxSize(u64),
    RotateInterval(String),
    BufferSize(usize),
    MaxBackups(usize),
    Compress(bool),
    TimeFormat(String),
    FilePerm(u32),
    PrintAfterInit(bool),
    Color(bool),
    CallerSkip(usize),
}

/// Set the level; anything but debug/info/warn/error becomes info.
pub fn with_level(level: &str) -> LogOption {
    LogOption::Level(Level::parse_lossy(level))
}

/// Set the size that triggers rotation; 0 means the 100 MiB default.
pub fn with_max_size(max_size: u64) -> LogOption {
    if max_size == 0 {
        LogOption::MaxSize(DEFAULT_MAX_SIZE)
    } else {
        LogOption::MaxSize(max_size)
    }
}

/// Set the time rotation interval, e.g. `30m`, `12h`, `1d`, `1w`.
pub fn with_rotate_interval(interval: &str) -> LogOption {
    LogOption::RotateInterval(interval.to_string())
}

pub fn with_buffer_size(buffer_size: usize) -> LogOption {
    LogOption::BufferSize(buffer_size)
}

pub fn with_max_backups(max_backups: usize) -> LogOption {
    LogOption::MaxBackups(max_backups)
}

pub fn with_compress(compress: bool) -> LogOption {
    LogOption::Compress(compress)
}

/// Set the timestamp format, as a `time` crate format description.
pub fn with_time_format(format: &str) -> LogOption {
    LogOption::TimeFormat(format.to_string())
}

pub fn with_file_perm(perm: u32) -> LogOption {
    LogOption::FilePerm(perm)
}

pub fn with_print_after_init(enable: bool) -> LogOption {
    LogOption::PrintAfterInit(enable)
}

pub fn with_color(enable: bool) -> LogOption {
    LogOption::Color(enable)
}

/// Set the caller skip depth; negative values clamp to 0.
pub fn with_caller_skip(skip: i64) -> LogOption {
    LogOption::CallerSkip(usize::try_from(skip).unwrap_or(0))
}
