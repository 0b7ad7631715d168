//! Process-wide logger.
//!
//! One lock guards both the current logger and the flag recording whether
//! [`init`] / [`init_file`] already ran. Readers lazily get a default stdout
//! logger; [`set_logger`] replaces whatever is installed at any time.

use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;

use crate::{LogOption, Logger, Result, Slogger, new_file_logger, new_stdout_logger};

struct GlobalState {
    logger: Option<Arc<dyn Logger>>,
    init_attempted: bool,
}

static GLOBAL: Lazy<RwLock<GlobalState>> = Lazy::new(|| {
    RwLock::new(GlobalState {
        logger: None,
        init_attempted: false,
    })
});

fn read_state() -> RwLockReadGuard<'static, GlobalState> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state() -> RwLockWriteGuard<'static, GlobalState> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
}

/// Install a stdout logger as the global logger.
///
/// Only the first call to `init` or [`init_file`] does anything; later calls
/// return `Ok(())`.
pub fn init<I>(options: I) -> Result<()>
where
    I: IntoIterator<Item = LogOption>,
{
    init_with(|| new_stdout_logger(options))
}

/// Install a file logger as the global logger.
///
/// Shares the one-time guard with [`init`].
pub fn init_file<P, I>(path: P, options: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = LogOption>,
{
    init_with(|| new_file_logger(path, options))
}

fn init_with<F>(build: F) -> Result<()>
where
    F: FnOnce() -> Result<Slogger>,
{
    let mut state = write_state();
    if state.init_attempted {
        return Ok(());
    }
    state.init_attempted = true;

    let logger = build()?;
    state.logger = Some(Arc::new(logger));
    Ok(())
}

/// Replace the global logger, regardless of earlier initialization.
pub fn set_logger(logger: Arc<dyn Logger>) {
    write_state().logger = Some(logger);
}

/// The current global logger, creating a default stdout logger if none is set.
///
/// # Panics
///
/// Panics if the default logger cannot be built.
pub fn get_logger() -> Arc<dyn Logger> {
    {
        let state = read_state();
        if let Some(logger) = &state.logger {
            return Arc::clone(logger);
        }
    }

    let mut state = write_state();
    Arc::clone(state.logger.get_or_insert_with(default_logger))
}

fn default_logger() -> Arc<dyn Logger> {
    match new_stdout_logger([]) {
        Ok(logger) => Arc::new(logger),
        Err(err) => panic!("failed to create default logger: {}", err),
    }
}

/// Write raw bytes through the global logger.
pub fn write(buf: &[u8]) -> io::Result<usize> {
    get_logger().write(buf)
}

/// Log at info level through the global logger.
///
/// ```rust
/// slogger::info!("listening on {}", 8080);
/// ```
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::Logger::info(&*$crate::get_logger(), ::std::format_args!($($arg)+))
    };
}

/// Log at error level through the global logger.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::Logger::error(&*$crate::get_logger(), ::std::format_args!($($arg)+))
    };
}

/// Log at warn level through the global logger.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::Logger::warn(&*$crate::get_logger(), ::std::format_args!($($arg)+))
    };
}

/// Log at debug level through the global logger.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::Logger::debug(&*$crate::get_logger(), ::std::format_args!($($arg)+))
    };
}

/// Log at fatal level through the global logger. Does not exit.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        $crate::Logger::fatal(&*$crate::get_logger(), ::std::format_args!($($arg)+))
    };
}
