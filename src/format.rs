//! Line formatter: `[datetime] [LEVEL] [caller] message`.

use std::fmt::{self, Write as _};

use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::Result;

/// Field carrying the `file:line` of the facade call.
pub(crate) const CALLER_FIELD: &str = "caller";
/// Field marking an error-level event as fatal.
pub(crate) const FATAL_FIELD: &str = "fatal";

const RESET: &str = "\x1b[0m";

/// Renders every event as one templated line.
#[derive(Debug, Clone)]
pub struct LineFormat {
    time_format: String,
    color: bool,
}

impl LineFormat {
    /// Create a formatter, validating `time_format` as a `time` format description.
    pub fn new(time_format: &str, color: bool) -> Result<Self> {
        time::format_description::parse(time_format)?;
        Ok(Self {
            time_format: time_format.to_string(),
            color,
        })
    }

    fn timestamp(&self) -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        time::format_description::parse(&self.time_format)
            .ok()
            .and_then(|format| now.format(&format).ok())
            .unwrap_or_default()
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = LineFields::default();
        event.record(&mut fields);

        let meta = event.metadata();
        let caller = fields
            .caller
            .take()
            .unwrap_or_else(|| match (meta.file(), meta.line()) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                _ => meta.target().to_string(),
            });
        let tag = level_tag(meta.level(), fields.fatal);

        write!(writer, "[{}] ", self.timestamp())?;
        if self.color {
            write!(writer, "[{}{}{}] ", level_color(meta.level(), fields.fatal), tag, RESET)?;
        } else {
            write!(writer, "[{}] ", tag)?;
        }
        write!(writer, "[{}] {}", caller, fields.message)?;
        for (name, value) in &fields.extra {
            write!(writer, " {}={}", name, value)?;
        }
        writeln!(writer)
    }
}

fn level_tag(level: &Level, fatal: bool) -> &'static str {
    if fatal {
        return "FATAL";
    }
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        _ => "ERROR",
    }
}

fn level_color(level: &Level, fatal: bool) -> &'static str {
    if fatal {
        return "\x1b[1;31m";
    }
    match *level {
        Level::TRACE => "\x1b[90m",
        Level::DEBUG => "\x1b[36m",
        Level::INFO => "\x1b[32m",
        Level::WARN => "\x1b[33m",
        _ => "\x1b[31m",
    }
}

/// Collects the fields the line template needs.
#[derive(Default)]
struct LineFields {
    message: String,
    caller: Option<String>,
    fatal: bool,
    extra: Vec<(&'static str, String)>,
}

impl Visit for LineFields {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == FATAL_FIELD {
            self.fatal = value;
        } else {
            self.extra.push((field.name(), value.to_string()));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            CALLER_FIELD => self.caller = Some(value.to_string()),
            name => self.extra.push((name, value.to_string())),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            CALLER_FIELD => self.caller = Some(format!("{:?}", value)),
            name => self.extra.push((name, format!("{:?}", value))),
        }
    }
}
