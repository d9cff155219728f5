use super::process::ProcessLogger;
use crate::domain::{Fields, LogEvent, Severity};
use crate::remote::RemoteForwarder;
use std::sync::Arc;

/// Cheap, cloneable front end to the process logger.
///
/// Every event goes through the local threshold first and then, on its own
/// threshold, to the remote forwarder when one is attached.
#[derive(Debug, Clone)]
pub struct Logger {
    process: Arc<ProcessLogger>,
    remote: Option<RemoteForwarder>,
    name: Option<String>,
}

macro_rules! level_methods {
    ($($plain:ident, $with_fields:ident => $severity:expr;)*) => {
        $(
            pub fn $plain(&self, message: impl Into<String>) {
                self.emit($severity, message, None);
            }

            pub fn $with_fields(&self, message: impl Into<String>, fields: Fields) {
                self.emit($severity, message, Some(fields));
            }
        )*
    };
}

impl Logger {
    pub fn new(process: Arc<ProcessLogger>) -> Self {
        Self {
            process,
            remote: None,
            name: None,
        }
    }

    pub fn with_remote(mut self, remote: RemoteForwarder) -> Self {
        self.remote = Some(remote);
        self
    }

    /// A handle whose events carry `name` as their logger name.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self.clone()
        }
    }

    pub fn process(&self) -> &Arc<ProcessLogger> {
        &self.process
    }

    pub fn remote(&self) -> Option<&RemoteForwarder> {
        self.remote.as_ref()
    }

    level_methods! {
        debug, debug_with_fields => Severity::Debug;
        info, info_with_fields => Severity::Info;
        notice, notice_with_fields => Severity::Notice;
        warning, warning_with_fields => Severity::Warning;
        error, error_with_fields => Severity::Error;
        critical, critical_with_fields => Severity::Critical;
        alert, alert_with_fields => Severity::Alert;
        emergency, emergency_with_fields => Severity::Emergency;
    }

    fn emit(&self, severity: Severity, message: impl Into<String>, fields: Option<Fields>) {
        let mut event = LogEvent::new(severity, message);
        if let Some(fields) = fields {
            event = event.with_fields(fields);
        }
        if let Some(name) = &self.name {
            event = event.with_logger(name.clone());
        }
        self.log(&event);
    }

    /// Write `event` locally, then offer it to the remote forwarder.
    ///
    /// A failed delivery is recorded locally at Debug and never forwarded.
    pub fn log(&self, event: &LogEvent) {
        self.process.log(event);

        let Some(remote) = &self.remote else {
            return;
        };
        if let Err(e) = remote.forward(event) {
            let mut note = LogEvent::new(Severity::Debug, "Failed to forward log event")
                .with_field("error", e.to_string())
                .with_field("level", event.severity);
            if let Some(logger) = &event.logger {
                note = note.with_logger(logger.clone());
            }
            self.process.log(&note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::sink::MemorySink;
    use crate::remote::{DeliveryError, RemoteGate, RemoteLogMessage};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    fn initialized(min: Severity) -> (Arc<ProcessLogger>, MemorySink) {
        let process = Arc::new(ProcessLogger::with_buffer_console(None));
        let sink = MemorySink::new();
        process
            .initialize_with_sinks(vec![Box::new(sink.clone())], min)
            .unwrap();
        (process, sink)
    }

    fn parsed(sink: &MemorySink) -> Vec<Value> {
        sink.lines()
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_named_logger_and_fields() {
        let (process, sink) = initialized(Severity::Debug);
        let logger = Logger::new(process).named("inventory");

        let mut fields = Fields::new();
        fields.insert("count".to_string(), json!(3));
        logger.notice_with_fields("items loaded", fields);

        let lines = parsed(&sink);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "notice");
        assert_eq!(lines[0]["logger"], "inventory");
        assert_eq!(lines[0]["message"], "items loaded");
        assert_eq!(lines[0]["count"], 3);
    }

    #[test]
    fn test_remote_receives_full_event() {
        let (process, _sink) = initialized(Severity::Debug);
        let seen = Arc::new(Mutex::new(Vec::<RemoteLogMessage>::new()));
        let recorder = Arc::clone(&seen);
        let forwarder = RemoteForwarder::new(
            Arc::new(RemoteGate::default()),
            Arc::new(move |m: &RemoteLogMessage| -> Result<(), DeliveryError> {
                recorder.lock().push(m.clone());
                Ok(())
            }),
        );
        let logger = Logger::new(process).with_remote(forwarder).named("db");

        logger.debug("below remote threshold");
        logger.error("query failed");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].logger.as_deref(), Some("db"));
        assert_eq!(seen[0].data, Some(json!("query failed")));
    }

    #[test]
    fn test_delivery_failure_logged_locally_at_debug() {
        let (process, sink) = initialized(Severity::Debug);
        let forwarder = RemoteForwarder::new(
            Arc::new(RemoteGate::default()),
            Arc::new(|_: &RemoteLogMessage| -> Result<(), DeliveryError> {
                Err(DeliveryError::Disconnected)
            }),
        );
        let logger = Logger::new(process).with_remote(forwarder);

        logger.warning("original");

        let lines = parsed(&sink);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["message"], "original");
        assert_eq!(lines[0]["level"], "warning");
        assert_eq!(lines[1]["level"], "debug");
        assert_eq!(lines[1]["message"], "Failed to forward log event");
    }

    #[test]
    fn test_delivery_failure_note_respects_local_threshold() {
        let (process, sink) = initialized(Severity::Info);
        let forwarder = RemoteForwarder::new(
            Arc::new(RemoteGate::default()),
            Arc::new(|_: &RemoteLogMessage| -> Result<(), DeliveryError> {
                Err(DeliveryError::Disconnected)
            }),
        );
        Logger::new(process).with_remote(forwarder).info("kept");

        let lines = parsed(&sink);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "kept");
    }
}
