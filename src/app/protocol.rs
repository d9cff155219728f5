// JSON-RPC 2.0 messages exchanged over stdio.

use crate::remote::{RemoteGate, RemoteLogMessage};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

pub const JSONRPC_VERSION: &str = "2.0";
pub const SET_LEVEL_METHOD: &str = "logging/setLevel";
pub const LOG_NOTIFICATION_METHOD: &str = "notifications/message";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
}

impl ProtocolError {
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self {
            code: PARSE_ERROR,
            message: format!("Parse error: {detail}"),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("Method not found: {method}"),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: ProtocolError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn log_message(message: &RemoteLogMessage) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: LOG_NOTIFICATION_METHOD.to_string(),
            params: serde_json::to_value(message)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SetLevelParams {
    level: Option<Value>,
}

/// Apply a `logging/setLevel` request to `gate`. Replies `{}` on success.
pub fn handle_set_level(gate: &RemoteGate, params: &Value) -> Result<Value, ProtocolError> {
    let params: SetLevelParams = serde_json::from_value(params.clone())
        .map_err(|e| ProtocolError::invalid_params(format!("Invalid params: {e}")))?;

    let level = match params.level {
        Some(Value::String(level)) => level,
        Some(other) => {
            return Err(ProtocolError::invalid_params(format!(
                "level must be a string, got {other}"
            )));
        }
        None => return Err(ProtocolError::invalid_params("missing required param: level")),
    };

    let severity = gate
        .set_threshold(&level)
        .map_err(|e| ProtocolError::invalid_params(e.to_string()))?;
    info!(level = %severity, "Setting minimum remote log level");
    Ok(json!({}))
}

/// Route one request.
///
/// A notification that succeeds gets no reply. One that fails still gets an
/// error reply, with a null `id` since there is nothing to correlate it to.
pub fn dispatch(gate: &RemoteGate, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    let outcome = match request.method.as_str() {
        SET_LEVEL_METHOD => handle_set_level(gate, &request.params),
        other => Err(ProtocolError::method_not_found(other)),
    };

    match (request.id.clone(), outcome) {
        (Some(id), Ok(result)) => Some(JsonRpcResponse::success(id, result)),
        (Some(id), Err(error)) => Some(JsonRpcResponse::failure(id, error)),
        (None, Ok(_)) => None,
        (None, Err(error)) => {
            debug!(method = %request.method, "Notification rejected: {}", error.message);
            Some(JsonRpcResponse::failure(Value::Null, error))
        }
    }
}

/// Parse and route one raw line.
pub fn handle_line(gate: &RemoteGate, line: &str) -> Option<JsonRpcResponse> {
    match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => dispatch(gate, &request),
        Err(e) => Some(JsonRpcResponse::failure(
            Value::Null,
            ProtocolError::parse_error(e),
        )),
    }
}
