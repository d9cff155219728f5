use crate::domain::{Severity, SeverityError};
use std::sync::atomic::{AtomicU8, Ordering};

/// Runtime-adjustable threshold for forwarding events to a remote
/// subscriber. Independent of the local log threshold.
#[derive(Debug)]
pub struct RemoteGate {
    threshold: AtomicU8,
}

impl Default for RemoteGate {
    fn default() -> Self {
        Self::new(Severity::default())
    }
}

impl RemoteGate {
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold: AtomicU8::new(threshold.rank()),
        }
    }

    pub fn threshold(&self) -> Severity {
        Severity::from_rank(self.threshold.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Replace the threshold. Unknown names leave it untouched.
    pub fn set_threshold(&self, name: &str) -> Result<Severity, SeverityError> {
        let level: Severity = name.parse()?;
        self.threshold.store(level.rank(), Ordering::Release);
        Ok(level)
    }

    pub fn allows(&self, severity: Severity) -> bool {
        severity.passes(self.threshold())
    }
}
