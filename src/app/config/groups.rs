use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rotation policy for the log file sink.
///
/// Zero for `max_backups` keeps every backup; zero for `max_age_days`
/// disables age-based removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 100,
            max_backups: 0,
            max_age_days: 0,
            compress: false,
        }
    }
}

impl RotationConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age_days > 0).then(|| Duration::from_secs(self.max_age_days * 24 * 3600))
    }
}

/// Output settings that come from flags only, never from the JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub console: bool,
    pub remote_logging: bool,
    pub rotation: RotationConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            console: true,
            remote_logging: true,
            rotation: RotationConfig::default(),
        }
    }
}
