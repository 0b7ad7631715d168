use thiserror::Error as ThisError;

/// Errors that can occur while building a logger
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// The configured time format could not be parsed.
    #[error("Time format error: {0}")]
    TimeFormat(#[from] time::error::InvalidFormatDescription),
    /// The rotation interval string is malformed.
    #[error("Invalid rotate interval: {0}")]
    Interval(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
