//! Example of loading logger configuration from a TOML file and installing it
//! globally through the builder.
//!
//! Run with:
//! ```bash
//! cargo run --example config_toml
//! ```

use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct Config {
    log: slogger::LoggerConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string("demos/config.toml")?;
    let root: Config = toml::from_str(&content)?;

    slogger::LoggerBuilder::from_config(root.log).init()?;

    slogger::info!("configured from TOML");
    slogger::warn!(
        "rotation every {:?}",
        slogger::parse_rotate_interval("1d")?
    );

    Ok(())
}
