//! Example of loading logger configuration from a YAML file.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;
use std::fs;

use slogger::{Logger, LoggerConfig, Slogger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_content = fs::read_to_string("demos/config.yaml")?;

    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&config_content)?;
    let config: LoggerConfig = serde_yaml::from_value(root["log"].clone())?;

    let temp_dir = tempfile::tempdir()?;
    let logger = Slogger::file(temp_dir.path().join("app.log"), config)?;

    logger.debug(format_args!("This is a debug message"));
    logger.info(format_args!("This is an info message"));
    logger.warn(format_args!("Resource not found: {}", "/api/users"));
    logger.flush()?;

    print!("{}", fs::read_to_string(temp_dir.path().join("app.log"))?);

    Ok(())
}
