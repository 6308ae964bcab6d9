//! Structured logging.
//!
//! Every record is printed as one JSON object per line:
//!
//! ```text
//! {"timestamp":"2024-05-01 10:15:42.318","level":"EVENT","message":"Finished updating Kubernetes endpoints."}
//! ```
//!
//! `tracing` has no EVENT level, so state-change records are INFO records
//! with the [`EVENT_TARGET`] target, written through [`log_event!`](crate::log_event).

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::observability::notify::NotifyQueue;

/// Target of EVENT records.
pub const EVENT_TARGET: &str = "endpoint_sentinel::event";

/// Target of local notifier diagnostics. Never forwarded to the webhook.
pub const NOTIFY_TARGET: &str = "endpoint_sentinel::notify";

/// Log an EVENT record (a state change worth notifying about).
#[macro_export]
macro_rules! log_event {
    ($($arg:tt)+) => {
        ::tracing::info!(target: $crate::observability::logging::EVENT_TARGET, $($arg)+)
    };
}

/// Level as printed in a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Event,
    Error,
}

impl LogLevel {
    /// WARN has no printed level of its own and is reported as ERROR.
    pub fn of(meta: &Metadata<'_>) -> Self {
        match *meta.level() {
            Level::ERROR | Level::WARN => LogLevel::Error,
            Level::INFO if meta.target() == EVENT_TARGET => LogLevel::Event,
            Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Event => "EVENT",
            LogLevel::Error => "ERROR",
        }
    }

    /// EVENT and ERROR records are sent to the webhook.
    pub fn is_notifiable(self) -> bool {
        matches!(self, LogLevel::Event | LogLevel::Error)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall clock rendered in the configured timezone, millisecond precision.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// `None` if `name` is not an IANA timezone.
    pub fn parse(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }

    pub fn timestamp(&self) -> String {
        self.format(Utc::now())
    }

    pub fn format(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::utc()
    }
}

/// One printed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogRecord {
    pub fn from_event(clock: &Clock, event: &Event<'_>) -> Self {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        Self {
            timestamp: clock.timestamp(),
            level: LogLevel::of(event.metadata()),
            message: visitor.render(),
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Collects the message and appends structured fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn render(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.join(" ")
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// `FormatEvent` that writes [`LogRecord`]s as JSON lines and, when a
/// notifier is attached, hands the same record to its queue.
#[derive(Debug, Clone, Default)]
pub struct JsonLine {
    clock: Clock,
    notify: Option<NotifyQueue>,
}

impl JsonLine {
    pub fn new(clock: Clock) -> Self {
        Self { clock, notify: None }
    }

    pub fn with_notifier(mut self, queue: NotifyQueue) -> Self {
        self.notify = Some(queue);
        self
    }
}

impl<S, N> FormatEvent<S, N> for JsonLine
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
        let record = LogRecord::from_event(&self.clock, event);
        let line = record.to_line().map_err(|_| fmt::Error)?;
        writeln!(writer, "{}", line)?;

        if let Some(queue) = &self.notify {
            queue.offer(event.metadata().target(), &record);
        }
        Ok(())
    }
}

/// Filter directive for the configured verbosity.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    let level = if config.is_debug() { "debug" } else { "info" };
    format!("warn,endpoint_sentinel={}", level)
}

/// Install the global subscriber. When `notify` is given, EVENT and ERROR
/// records are also queued for the webhook.
///
/// `RUST_LOG` overrides the configured verbosity when set.
pub fn init_logging(
    config: &ObservabilityConfig,
    clock: Clock,
    notify: Option<NotifyQueue>,
) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let mut format = JsonLine::new(clock);
    if let Some(queue) = notify {
        format = format.with_notifier(queue);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .try_init()
}
