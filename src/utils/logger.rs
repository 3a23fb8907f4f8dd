use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Collects event fields into a JSON map.
#[derive(Default)]
struct FieldCollector(Map<String, Value>);

impl FieldCollector {
    fn put(&mut self, field: &Field, value: impl Into<Value>) {
        // `event_name` -> `event.name`, following OTel attribute naming.
        let name = match field.name() {
            "event_name" => "event.name".to_string(),
            "event_domain" => "event.domain".to_string(),
            other => other.to_string(),
        };
        self.0.insert(name, value.into());
    }
}

impl Visit for FieldCollector {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}

/// One JSON object per line, shaped like an OTel log record.
struct OtelJsonFormat {
    resource: Map<String, Value>,
}

impl OtelJsonFormat {
    fn new(config: &LoggingConfig) -> Self {
        let mut resource = Map::new();
        resource.insert("service.name".into(), config.service_name.clone().into());
        resource.insert("service.version".into(), config.service_version.clone().into());
        OtelJsonFormat { resource }
    }
}

fn severity_number(level: &Level) -> u64 {
    match *level {
        Level::TRACE => 1,
        Level::DEBUG => 5,
        Level::INFO => 9,
        Level::WARN => 13,
        Level::ERROR => 17,
    }
}

impl<S, N> FormatEvent<S, N> for OtelJsonFormat
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        let mut attributes = fields.0;

        let body = match attributes.remove("message") {
            Some(Value::String(s)) => s,
            _ => metadata.name().to_string(),
        };
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            attributes.insert("code.filepath".into(), file.into());
            attributes.insert("code.lineno".into(), line.into());
        }
        attributes.insert("code.target".into(), metadata.target().into());

        let record = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": severity_number(metadata.level()),
            "body": body,
            "resource": Value::Object(self.resource.clone()),
            "attributes": Value::Object(attributes),
        });
        let line = serde_json::to_string(&record).map_err(|_| std::fmt::Error)?;
        writer.write_str(&line)?;
        writer.write_char('\n')
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            other
        )),
    }
}

/// Install the global subscriber. `RUST_LOG` directives refine the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let level = parse_level(&config.level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // Records emitted through the `log` crate (reqwest, hyper) become tracing events.
    tracing_log::LogTracer::init().map_err(|e| e.to_string())?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format.to_lowercase().as_str() {
        "json" => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().event_format(OtelJsonFormat::new(config))),
        ),
        _ => tracing::subscriber::set_global_default(registry.with(fmt::layer().pretty())),
    };
    result.map_err(|e| e.to_string())
}
