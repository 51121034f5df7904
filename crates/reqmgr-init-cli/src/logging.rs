// crates/reqmgr-init-cli/src/logging.rs
// ============================================================================
// Module: Structured Logging
// Description: Log subscriber setup with a JSON line formatter.
// Purpose: Emit one machine-readable audit record per event on stderr.
// Dependencies: tracing, tracing-subscriber, serde_json, time
// ============================================================================

//! ## Overview
//! Two shapes are supported. `json` renders each event as one object with
//! `time` (RFC 3339, UTC), `level`, `msg`, and every event field at the top
//! level. `text` uses the stock `tracing-subscriber` formatter. Both write to
//! stderr so stdout carries only the operator summary.
//!
//! Fields named in [`JSON_FIELDS`] are emitted by callers as serialized JSON
//! text and are embedded as nested values rather than strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use reqmgr_init_config::LogFormat;
use reqmgr_init_config::LogLevel;
use reqmgr_init_core::now_utc;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::Event;
use tracing::Level;
use tracing::Subscriber;
use tracing::field::Field;
use tracing::field::Visit;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fields carrying serialized JSON that are embedded as nested values.
pub const JSON_FIELDS: &[&str] = &["details", "steps", "next_steps", "context", "causes"];

/// Field holding the event message.
const MESSAGE_FIELD: &str = "message";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to install the global subscriber.
#[derive(Debug, Error)]
#[error("failed to install log subscriber: {0}")]
pub struct LoggingError(String);

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Returns the filter directive for `level`; `verbose` forces `debug`.
#[must_use]
pub fn filter_directive(level: LogLevel, verbose: bool) -> &'static str {
    if verbose && !matches!(level, LogLevel::Trace) {
        return LogLevel::Debug.as_str();
    }
    level.as_str()
}

/// Installs the global log subscriber writing to stderr.
///
/// # Errors
///
/// Returns [`LoggingError`] when a global subscriber is already installed.
pub fn init_logging(level: LogLevel, format: LogFormat, verbose: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::new(filter_directive(level, verbose));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Json => builder.event_format(JsonLineFormat).try_init(),
        LogFormat::Text => builder.with_ansi(false).with_target(false).try_init(),
    };
    installed.map_err(|err| LoggingError(err.to_string()))
}

// ============================================================================
// SECTION: JSON Formatter
// ============================================================================

/// Event formatter producing one JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineFormat;

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let record = render_record(now_utc(), *event.metadata().level(), fields);
        writeln!(writer, "{record}")
    }
}

/// Builds the JSON record for one event.
pub(crate) fn render_record(time: OffsetDateTime, level: Level, fields: FieldCollector) -> Value {
    let mut record = Map::new();
    let stamp = time.format(&Rfc3339).unwrap_or_else(|_| time.unix_timestamp().to_string());
    record.insert("time".to_string(), Value::String(stamp));
    record.insert("level".to_string(), Value::String(level.as_str().to_ascii_lowercase()));
    record.insert("msg".to_string(), Value::String(fields.message.unwrap_or_default()));
    for (key, value) in fields.fields {
        record.entry(key).or_insert(value);
    }
    Value::Object(record)
}

/// Collects event fields as JSON values.
#[derive(Debug, Default)]
pub(crate) struct FieldCollector {
    /// Event message.
    message: Option<String>,
    /// Remaining fields by name.
    fields: Map<String, Value>,
}

impl FieldCollector {
    /// Stores `value` under the field's name.
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }

    /// Stores a textual value, embedding serialized JSON for nested fields.
    fn insert_text(&mut self, field: &Field, text: String) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(text);
            return;
        }
        if JSON_FIELDS.contains(&field.name())
            && let Ok(value) = serde_json::from_str::<Value>(&text)
        {
            self.insert(field, value);
            return;
        }
        self.insert(field, Value::String(text));
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_text(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    #[allow(clippy::use_debug, reason = "Display-wrapped fields arrive through Debug.")]
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert_text(field, format!("{value:?}"));
    }
}
