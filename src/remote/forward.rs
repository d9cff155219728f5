use super::gate::RemoteGate;
use crate::domain::{LogEvent, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("No remote subscriber is connected")]
    Disconnected,
    #[error("Failed to encode remote log message: {0}")]
    Encode(String),
    #[error("Delivery failed: {0}")]
    Transport(String),
}

/// Payload of a remote log notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLogMessage {
    pub level: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&LogEvent> for RemoteLogMessage {
    fn from(event: &LogEvent) -> Self {
        let data = if event.has_fields() {
            let mut object = serde_json::Map::with_capacity(event.fields.len() + 1);
            object.insert("message".to_string(), Value::String(event.message.clone()));
            for (key, value) in &event.fields {
                if key != "message" {
                    object.insert(key.clone(), value.clone());
                }
            }
            Value::Object(object)
        } else {
            Value::String(event.message.clone())
        };

        Self {
            level: event.severity,
            logger: event.logger.clone(),
            data: Some(data),
        }
    }
}

/// Hands a message to whoever is listening remotely.
pub trait Deliver: Send + Sync {
    fn deliver(&self, message: &RemoteLogMessage) -> Result<(), DeliveryError>;
}

impl<F> Deliver for F
where
    F: Fn(&RemoteLogMessage) -> Result<(), DeliveryError> + Send + Sync,
{
    fn deliver(&self, message: &RemoteLogMessage) -> Result<(), DeliveryError> {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forwarded {
    Sent,
    BelowThreshold,
}

/// Deliver `event` if it passes the gate.
pub fn maybe_forward(
    gate: &RemoteGate,
    event: &LogEvent,
    deliver: &dyn Deliver,
) -> Result<Forwarded, DeliveryError> {
    if !gate.allows(event.severity) {
        return Ok(Forwarded::BelowThreshold);
    }
    deliver.deliver(&RemoteLogMessage::from(event))?;
    Ok(Forwarded::Sent)
}

/// A gate paired with its delivery target.
#[derive(Clone)]
pub struct RemoteForwarder {
    gate: Arc<RemoteGate>,
    deliver: Arc<dyn Deliver>,
}

impl std::fmt::Debug for RemoteForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteForwarder")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl RemoteForwarder {
    pub fn new(gate: Arc<RemoteGate>, deliver: Arc<dyn Deliver>) -> Self {
        Self { gate, deliver }
    }

    pub fn gate(&self) -> &Arc<RemoteGate> {
        &self.gate
    }

    pub fn forward(&self, event: &LogEvent) -> Result<Forwarded, DeliveryError> {
        maybe_forward(&self.gate, event, self.deliver.as_ref())
    }
}
