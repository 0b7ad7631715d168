//! Basic console logging example.
//!
//! Initializes the global logger and logs through the package-level macros.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    slogger::init([slogger::with_level("debug"), slogger::with_color(true)])?;

    slogger::debug!("This is a debug message");
    slogger::info!("This is an info message");
    slogger::warn!("This is a warning message");
    slogger::error!("This is an error message");
    slogger::fatal!("This is a fatal message, and the process keeps running");

    Ok(())
}
