//! Reporting ORM queries through the global logger.

use std::time::{Duration, Instant};

use slogger::orm::{OrmConfig, OrmLevel, OrmLogger, RecordNotFound, SloggerOrm};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    slogger::init([slogger::with_level("debug")])?;

    let orm = SloggerOrm::new(OrmConfig {
        slow_threshold: Duration::from_millis(10),
        ignore_record_not_found_error: true,
        log_level: OrmLevel::Info,
    });

    let begin = Instant::now();
    orm.trace(begin, &|| ("SELECT * FROM users".to_string(), 3), None);

    let begin = Instant::now();
    std::thread::sleep(Duration::from_millis(20));
    orm.trace(begin, &|| ("UPDATE users SET seen = 1".to_string(), -1), None);

    // Ignored: falls through to the per-query trace line.
    orm.trace(
        Instant::now(),
        &|| ("SELECT * FROM users WHERE id = 9".to_string(), 0),
        Some(&RecordNotFound),
    );

    orm.log_mode(OrmLevel::Silent)
        .info(format_args!("never shown"));

    Ok(())
}
