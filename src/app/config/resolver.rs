use super::ConfigError;
use super::discovery::{PathCategory, PathDiscovery, SourceKind};
use super::snapshot::ConfigSnapshot;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A file location that may hold a configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl ConfigSource {
    pub fn new(kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// What happened to one source during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Absent,
    /// Parsed; lists the fields this source supplied to the snapshot.
    Merged { fields: Vec<&'static str> },
    /// Present but unreadable or not valid JSON. Nothing was applied.
    Unparsable { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: ConfigSource,
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub snapshot: ConfigSnapshot,
    pub report: Vec<SourceReport>,
}

/// Read one configuration file. `Ok(None)` when the file does not exist.
pub fn load_source(path: &Path) -> Result<Option<ConfigSnapshot>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::FileError(e)),
    };
    let layer: ConfigSnapshot = serde_json::from_str(&content)?;
    Ok(Some(layer))
}

/// Merge `overrides` with every source, in order.
///
/// A field set by an earlier layer is never replaced by a later one. A
/// source that fails to parse is skipped as a whole. Resolution itself
/// never fails.
pub fn resolve(overrides: ConfigSnapshot, sources: &[ConfigSource]) -> Resolution {
    let mut snapshot = overrides;
    let mut report = Vec::with_capacity(sources.len());

    for source in sources {
        let outcome = match load_source(&source.path) {
            Ok(None) => SourceOutcome::Absent,
            Ok(Some(layer)) => SourceOutcome::Merged {
                fields: snapshot.compose(layer),
            },
            Err(e) => SourceOutcome::Unparsable {
                error: e.to_string(),
            },
        };
        report.push(SourceReport {
            source: source.clone(),
            outcome,
        });
    }

    Resolution { snapshot, report }
}

/// Resolves configuration against the discovered config-file locations.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    discovery: PathDiscovery,
}

impl ConfigResolver {
    pub fn new(discovery: PathDiscovery) -> Self {
        Self { discovery }
    }

    pub fn discovery(&self) -> &PathDiscovery {
        &self.discovery
    }

    pub fn sources(&self) -> Vec<ConfigSource> {
        self.discovery
            .candidates(PathCategory::Config)
            .iter()
            .map(|candidate| ConfigSource::new(candidate.kind, candidate.path.clone()))
            .collect()
    }

    pub fn resolve(&self, overrides: ConfigSnapshot) -> Resolution {
        resolve(overrides, &self.sources())
    }
}
