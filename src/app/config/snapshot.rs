use crate::domain::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configuration layer, and after resolution the final snapshot.
///
/// Every field is optional: `None` means "not provided by this layer", which
/// is different from `Some("")`. The JSON keys match the on-disk files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Where the rotating log file lives. No file sink when unset.
    #[serde(rename = "LogPath", default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Minimum severity written to local sinks. Unset or unrecognized
    /// values mean `Info`.
    #[serde(rename = "MinLogLevel", default, skip_serializing_if = "Option::is_none")]
    pub min_log_level: Option<String>,

    /// Path to the inventory executable.
    #[serde(rename = "CLIPath", default, skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<PathBuf>,

    /// Address of a remote inventory web server.
    #[serde(rename = "WebServerAddress", default, skip_serializing_if = "Option::is_none")]
    pub web_server_address: Option<String>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every unset field from `lower`. Fields already set are never
    /// overwritten. Returns the names of the fields `lower` contributed.
    pub fn compose(&mut self, lower: ConfigSnapshot) -> Vec<&'static str> {
        let mut contributed = Vec::new();

        if self.log_path.is_none() && lower.log_path.is_some() {
            self.log_path = lower.log_path;
            contributed.push("LogPath");
        }
        if self.min_log_level.is_none() && lower.min_log_level.is_some() {
            self.min_log_level = lower.min_log_level;
            contributed.push("MinLogLevel");
        }
        if self.cli_path.is_none() && lower.cli_path.is_some() {
            self.cli_path = lower.cli_path;
            contributed.push("CLIPath");
        }
        if self.web_server_address.is_none() && lower.web_server_address.is_some() {
            self.web_server_address = lower.web_server_address;
            contributed.push("WebServerAddress");
        }

        contributed
    }

    pub fn min_severity(&self) -> Severity {
        self.min_log_level
            .as_deref()
            .map(Severity::parse_or_default)
            .unwrap_or_default()
    }

    /// Debug mode means the local threshold lets debug output through.
    pub fn is_debug_mode(&self) -> bool {
        self.min_severity() <= Severity::Debug
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
