use super::severity::Severity;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structured payload attached to a log event.
pub type Fields = Map<String, Value>;

/// Keys owned by the line encoding; user fields with these names are
/// written with a `field_` prefix instead.
const RESERVED_KEYS: [&str; 4] = ["time", "level", "logger", "message"];

/// A single log call. Immutable once built and consumed synchronously by
/// every sink before the call returns.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub fields: Fields,
    pub logger: Option<String>,
}

#[derive(Serialize)]
struct EncodedLine<'a> {
    time: String,
    level: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    logger: Option<&'a str>,
    message: &'a str,
    #[serde(flatten)]
    fields: BTreeMap<String, &'a Value>,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            severity,
            message: message.into(),
            fields: Fields::new(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach one field. Values that fail to serialize are recorded as a
    /// description of the failure rather than dropped.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")));
        self.fields.insert(key.into(), value);
        self
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Encode as one newline-terminated JSON object.
    pub fn to_json_line(&self) -> Vec<u8> {
        let fields = self
            .fields
            .iter()
            .map(|(key, value)| {
                let key = if RESERVED_KEYS.contains(&key.as_str()) {
                    format!("field_{key}")
                } else {
                    key.clone()
                };
                (key, value)
            })
            .collect();

        let line = EncodedLine {
            time: self.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            level: self.severity,
            logger: self.logger.as_deref(),
            message: &self.message,
            fields,
        };

        let mut bytes = serde_json::to_vec(&line).unwrap_or_else(|e| {
            // Only reachable through a broken Serialize impl on a field value.
            let fallback = serde_json::json!({
                "time": line.time,
                "level": self.severity,
                "message": self.message,
                "encode_error": e.to_string(),
            });
            fallback.to_string().into_bytes()
        });
        bytes.push(b'\n');
        bytes
    }
}
