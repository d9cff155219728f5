use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid log level '{input}'. Valid levels: {valid_levels:?}")]
pub struct SeverityError {
    pub input: String,
    pub valid_levels: Vec<&'static str>,
}

/// Severity of a log event, ordered from least to most severe.
///
/// The same ordering gates local sinks and remote forwarding, so every
/// comparison in the crate goes through [`Severity::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Canonical order, least severe first.
    pub const ALL: [Severity; 8] = [
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    /// Priority rank. This is the only rank table in the crate.
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            Severity::Debug => 10,
            Severity::Info => 20,
            Severity::Notice => 30,
            Severity::Warning => 40,
            Severity::Error => 50,
            Severity::Critical => 60,
            Severity::Alert => 70,
            Severity::Emergency => 80,
        }
    }

    pub const fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            10 => Some(Severity::Debug),
            20 => Some(Severity::Info),
            30 => Some(Severity::Notice),
            40 => Some(Severity::Warning),
            50 => Some(Severity::Error),
            60 => Some(Severity::Critical),
            70 => Some(Severity::Alert),
            80 => Some(Severity::Emergency),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
            Severity::Alert => "alert",
            Severity::Emergency => "emergency",
        }
    }

    /// `true` when an event of this severity passes a `threshold`.
    #[inline]
    pub const fn passes(self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Lenient parse used for configuration strings.
    ///
    /// Accepts the canonical names plus the `warn`, `trace`, `fatal` and
    /// `panic` aliases. Anything else, including the empty string, is
    /// `Info`.
    pub fn parse_or_default(name: &str) -> Self {
        if let Ok(level) = name.parse() {
            return level;
        }
        match name.trim().to_lowercase().as_str() {
            "warn" => Severity::Warning,
            "trace" => Severity::Debug,
            "fatal" | "panic" => Severity::Emergency,
            _ => Severity::Info,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Strict parse: canonical names only, case-insensitive.
impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == lowered)
            .ok_or_else(|| SeverityError {
                input: s.to_string(),
                valid_levels: Severity::ALL.iter().map(|l| l.as_str()).collect(),
            })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}
