use super::handle::Logger;
use crate::domain::{Fields, LogEvent, Severity};
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Field that, when present, replaces the severity derived from the tracing
/// level. Lets `tracing` call sites reach Notice, Critical, Alert and
/// Emergency.
pub const SEVERITY_FIELD: &str = "severity";

/// Routes `tracing` events into a [`Logger`].
///
/// The event target becomes the logger name, the `message` field becomes the
/// message and every other field is kept as structured data.
pub struct ProcessLoggerLayer {
    logger: Logger,
}

impl ProcessLoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    severity: Option<Severity>,
    values: Fields,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.values
                .insert(field.name().to_string(), json!(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            SEVERITY_FIELD if value.parse::<Severity>().is_ok() => {
                self.severity = value.parse().ok();
            }
            name => {
                self.values.insert(name.to_string(), json!(value));
            }
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.values.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.values.insert(field.name().to_string(), json!(value));
    }
}

impl<S: Subscriber> Layer<S> for ProcessLoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .unwrap_or_else(|| Severity::from(metadata.level()));
        let message = visitor.message.unwrap_or_else(|| metadata.name().to_string());

        let log_event = LogEvent::new(severity, message)
            .with_logger(metadata.target())
            .with_fields(visitor.values);
        self.logger.log(&log_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::process::ProcessLogger;
    use crate::logger::sink::MemorySink;
    use serde_json::Value;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let process = Arc::new(ProcessLogger::with_buffer_console(None));
        let sink = MemorySink::new();
        process
            .initialize_with_sinks(vec![Box::new(sink.clone())], Severity::Debug)
            .unwrap();

        let subscriber =
            tracing_subscriber::registry().with(ProcessLoggerLayer::new(Logger::new(process)));
        tracing::subscriber::with_default(subscriber, f);

        sink.lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_tracing_event_becomes_log_event() {
        let lines = capture(|| {
            tracing::warn!(target: "inventory", item = 7, "stock is low");
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "warning");
        assert_eq!(lines[0]["logger"], "inventory");
        assert_eq!(lines[0]["message"], "stock is low");
        assert_eq!(lines[0]["item"], 7);
    }

    #[test]
    fn test_severity_field_overrides_level() {
        let lines = capture(|| {
            tracing::error!(severity = "critical", "database unreachable");
        });

        assert_eq!(lines[0]["level"], "critical");
        assert!(lines[0].get("severity").is_none());
    }

    #[test]
    fn test_trace_maps_to_debug() {
        let lines = capture(|| {
            tracing::trace!("fine grained");
        });

        assert_eq!(lines[0]["level"], "debug");
    }
}
