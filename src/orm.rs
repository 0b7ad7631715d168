//! Query logging for ORMs.
//!
//! [`OrmLogger`] is the contract an ORM calls into; [`SloggerOrm`] routes it to
//! a [`Logger`], classifying failed, slow and ordinary queries.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::{Logger, get_logger};

/// ORM-side verbosity. Each level includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrmLevel {
    Silent = 1,
    Error,
    Warn,
    Info,
}

/// Settings an ORM hands to its logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Queries slower than this are reported; zero disables the check.
    pub slow_threshold: Duration,
    /// Skip error reports for [`RecordNotFound`].
    pub ignore_record_not_found_error: bool,
    pub log_level: OrmLevel,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_millis(200),
            ignore_record_not_found_error: false,
            log_level: OrmLevel::Warn,
        }
    }
}

/// Sentinel error for a lookup that matched no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordNotFound;

impl fmt::Display for RecordNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("record not found")
    }
}

impl StdError for RecordNotFound {}

/// Whether `err`, or any error in its source chain, is [`RecordNotFound`].
pub fn is_record_not_found(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<RecordNotFound>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// The logging interface an ORM drives.
pub trait OrmLogger: Send + Sync {
    /// A copy of this logger at a different verbosity.
    fn log_mode(&self, level: OrmLevel) -> Box<dyn OrmLogger>;

    #[track_caller]
    fn info(&self, args: fmt::Arguments<'_>);

    #[track_caller]
    fn warn(&self, args: fmt::Arguments<'_>);

    #[track_caller]
    fn error(&self, args: fmt::Arguments<'_>);

    /// Report a finished query that started at `begin`.
    ///
    /// `fc` yields the SQL text and affected rows (-1 when not applicable); it
    /// is only called when the query is actually reported.
    #[track_caller]
    fn trace(
        &self,
        begin: Instant,
        fc: &dyn Fn() -> (String, i64),
        err: Option<&(dyn StdError + 'static)>,
    );
}

/// [`OrmLogger`] backed by a [`Logger`], the global one unless given.
#[derive(Clone)]
pub struct SloggerOrm {
    config: OrmConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl SloggerOrm {
    /// Log through whatever [`get_logger`] returns at call time.
    pub fn new(config: OrmConfig) -> Self {
        Self {
            config,
            logger: None,
        }
    }

    /// Log through a specific logger.
    pub fn with_logger(config: OrmConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            logger: Some(logger),
        }
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    fn target(&self) -> Arc<dyn Logger> {
        match &self.logger {
            Some(logger) => Arc::clone(logger),
            None => get_logger(),
        }
    }

    fn silent(&self) -> bool {
        self.config.log_level <= OrmLevel::Silent
    }
}

impl fmt::Debug for SloggerOrm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SloggerOrm")
            .field("config", &self.config)
            .field("global", &self.logger.is_none())
            .finish()
    }
}

impl OrmLogger for SloggerOrm {
    fn log_mode(&self, level: OrmLevel) -> Box<dyn OrmLogger> {
        let mut logger = self.clone();
        logger.config.log_level = level;
        Box::new(logger)
    }

    #[track_caller]
    fn info(&self, args: fmt::Arguments<'_>) {
        if self.silent() {
            return;
        }
        let caller = Location::caller();
        self.target().info(format_args!("{} {}", caller, args));
    }

    #[track_caller]
    fn warn(&self, args: fmt::Arguments<'_>) {
        if self.silent() {
            return;
        }
        let caller = Location::caller();
        self.target().warn(format_args!("{} {}", caller, args));
    }

    #[track_caller]
    fn error(&self, args: fmt::Arguments<'_>) {
        if self.silent() {
            return;
        }
        let caller = Location::caller();
        self.target().error(format_args!("{} {}", caller, args));
    }

    #[track_caller]
    fn trace(
        &self,
        begin: Instant,
        fc: &dyn Fn() -> (String, i64),
        err: Option<&(dyn StdError + 'static)>,
    ) {
        if self.silent() {
            return;
        }

        let elapsed = begin.elapsed();
        let cost = elapsed.as_nanos() as f64 / 1e6;
        let caller = Location::caller();
        let level = self.config.log_level;
        let slow_threshold = self.config.slow_threshold;

        match err {
            Some(err)
                if level >= OrmLevel::Error
                    && (!is_record_not_found(err)
                        || !self.config.ignore_record_not_found_error) =>
            {
                let (sql, rows) = fc();
                self.target().error(format_args!(
                    "{} error={} [cost:{:.3}ms] [rows:{}] {}",
                    caller,
                    err,
                    cost,
                    display_rows(rows),
                    sql
                ));
            }
            _ if !slow_threshold.is_zero()
                && elapsed > slow_threshold
                && level >= OrmLevel::Warn =>
            {
                let (sql, rows) = fc();
                self.target().warn(format_args!(
                    "{} slow=SLOW SQL >= {:?} [cost:{:.3}ms] [rows:{}] {}",
                    caller,
                    slow_threshold,
                    cost,
                    display_rows(rows),
                    sql
                ));
            }
            _ if level == OrmLevel::Info => {
                let (sql, rows) = fc();
                self.target().debug(format_args!(
                    "{} [cost:{:.3}ms] [rows:{}] {}",
                    caller,
                    cost,
                    display_rows(rows),
                    sql
                ));
            }
            _ => {}
        }
    }
}

/// -1 means "not applicable" and shows as 0.
fn display_rows(rows: i64) -> i64 {
    if rows == -1 { 0 } else { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl Recorder {
        fn push(&self, level: &'static str, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push((level, args.to_string()));
        }

        fn lines(&self) -> Vec<(&'static str, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Logger for Recorder {
        fn info(&self, args: fmt::Arguments<'_>) {
            self.push("info", args);
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.push("error", args);
        }
        fn warn(&self, args: fmt::Arguments<'_>) {
            self.push("warn", args);
        }
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.push("debug", args);
        }
        fn fatal(&self, args: fmt::Arguments<'_>) {
            self.push("fatal", args);
        }
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
    }

    fn orm(level: OrmLevel, slow_threshold: Duration, ignore: bool) -> (Arc<Recorder>, SloggerOrm) {
        let recorder = Arc::new(Recorder::default());
        let config = OrmConfig {
            slow_threshold,
            ignore_record_not_found_error: ignore,
            log_level: level,
        };
        let logger = SloggerOrm::with_logger(config, recorder.clone());
        (recorder, logger)
    }

    fn started_ago(ms: u64) -> Instant {
        Instant::now() - Duration::from_millis(ms)
    }

    #[derive(Debug)]
    struct Wrapped(RecordNotFound);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_is_record_not_found_walks_sources() {
        assert!(is_record_not_found(&RecordNotFound));
        assert!(is_record_not_found(&Wrapped(RecordNotFound)));
        let other = io::Error::other("disk on fire");
        assert!(!is_record_not_found(&other));
    }

    #[test]
    fn test_ignored_not_found_emits_no_error() {
        let (recorder, logger) = orm(OrmLevel::Warn, Duration::ZERO, true);
        logger.trace(
            started_ago(1),
            &|| ("SELECT * FROM users WHERE id = 1".to_string(), 0),
            Some(&RecordNotFound),
        );
        assert!(recorder.lines().iter().all(|(level, _)| *level != "error"));
    }

    #[test]
    fn test_not_found_reported_when_not_ignored() {
        let (recorder, logger) = orm(OrmLevel::Error, Duration::ZERO, false);
        logger.trace(
            started_ago(1),
            &|| ("SELECT 1".to_string(), -1),
            Some(&RecordNotFound),
        );

        let lines = recorder.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "error");
        assert!(lines[0].1.contains("error=record not found"));
        assert!(lines[0].1.contains("[rows:0] SELECT 1"));
    }

    #[test]
    fn test_other_errors_ignore_the_not_found_flag() {
        let (recorder, logger) = orm(OrmLevel::Error, Duration::ZERO, true);
        let err = io::Error::other("syntax error");
        logger.trace(started_ago(1), &|| ("SELEC 1".to_string(), 0), Some(&err));

        let lines = recorder.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "error");
        assert!(lines[0].1.contains("error=syntax error"));
    }

    #[test]
    fn test_slow_query_warns_with_normalized_rows() {
        let (recorder, logger) = orm(OrmLevel::Warn, Duration::from_millis(10), false);
        logger.trace(
            started_ago(50),
            &|| ("UPDATE jobs SET done = 1".to_string(), -1),
            None,
        );

        let lines = recorder.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "warn");
        assert!(lines[0].1.contains("slow=SLOW SQL >= 10ms"), "{}", lines[0].1);
        assert!(lines[0].1.contains("[rows:0] UPDATE jobs SET done = 1"));
    }

    #[test]
    fn test_fast_query_at_warn_is_quiet_and_lazy() {
        let (recorder, logger) = orm(OrmLevel::Warn, Duration::from_secs(10), false);
        let called = Cell::new(false);
        logger.trace(
            Instant::now(),
            &|| {
                called.set(true);
                ("SELECT 1".to_string(), 1)
            },
            None,
        );
        assert!(recorder.lines().is_empty());
        assert!(!called.get(), "sql callback must not run for unreported queries");
    }

    #[test]
    fn test_info_level_traces_every_query() {
        let (recorder, logger) = orm(OrmLevel::Info, Duration::ZERO, false);
        logger.trace(Instant::now(), &|| ("SELECT 2".to_string(), 3), None);

        let lines = recorder.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "debug");
        assert!(lines[0].1.contains("[cost:"));
        assert!(lines[0].1.contains("ms] [rows:3] SELECT 2"));
    }

    #[test]
    fn test_silent_suppresses_everything() {
        let (recorder, logger) = orm(OrmLevel::Silent, Duration::from_millis(1), false);
        let err = io::Error::other("boom");
        logger.trace(started_ago(50), &|| ("SELECT 1".to_string(), 1), Some(&err));
        logger.info(format_args!("info"));
        logger.warn(format_args!("warn"));
        logger.error(format_args!("error"));
        assert!(recorder.lines().is_empty());
    }

    #[test]
    fn test_plain_callbacks_forward_with_caller() {
        let (recorder, logger) = orm(OrmLevel::Error, Duration::ZERO, false);
        logger.info(format_args!("migrated {} tables", 4));
        logger.warn(format_args!("deprecated"));
        logger.error(format_args!("failed"));

        let lines = recorder.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0, "info");
        assert!(lines[0].1.starts_with("src/orm.rs:"));
        assert!(lines[0].1.ends_with(" migrated 4 tables"));
        assert_eq!(lines[1].0, "warn");
        assert_eq!(lines[2].0, "error");
    }

    #[test]
    fn test_log_mode_changes_only_the_level() {
        let (recorder, logger) = orm(OrmLevel::Silent, Duration::ZERO, false);
        let verbose = logger.log_mode(OrmLevel::Info);
        verbose.trace(Instant::now(), &|| ("SELECT 3".to_string(), 1), None);
        logger.trace(Instant::now(), &|| ("SELECT 4".to_string(), 1), None);

        let lines = recorder.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.contains("SELECT 3"));
        assert_eq!(logger.config().log_level, OrmLevel::Silent);
    }
}
