use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const APP_NAME: &str = "wtinventory";
pub const CONFIG_FILE_NAME: &str = "wtinventory.json";

/// Kinds of on-disk locations, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Path named by the `<APP>_<CATEGORY>` environment variable.
    EnvOverride,
    /// XDG per-user directory (platform directory as fallback).
    UserDir,
    Home,
    ExecutableDir,
    WorkingDir,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::EnvOverride => "env",
            SourceKind::UserDir => "user-dir",
            SourceKind::Home => "home",
            SourceKind::ExecutableDir => "executable-dir",
            SourceKind::WorkingDir => "working-dir",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathCategory {
    Config,
    Data,
    Cache,
    Runtime,
}

impl PathCategory {
    fn env_suffix(self) -> &'static str {
        match self {
            PathCategory::Config => "CONFIG",
            PathCategory::Data => "DATA",
            PathCategory::Cache => "CACHE",
            PathCategory::Runtime => "RUNTIME",
        }
    }

    fn xdg_var(self) -> &'static str {
        match self {
            PathCategory::Config => "XDG_CONFIG_HOME",
            PathCategory::Data => "XDG_DATA_HOME",
            PathCategory::Cache => "XDG_CACHE_HOME",
            PathCategory::Runtime => "XDG_RUNTIME_DIR",
        }
    }

    fn platform_dir(self) -> Option<PathBuf> {
        match self {
            PathCategory::Config => dirs::config_dir(),
            PathCategory::Data => dirs::data_dir(),
            PathCategory::Cache => dirs::cache_dir(),
            // No per-user runtime dir on most platforms; fall back to temp.
            PathCategory::Runtime => dirs::runtime_dir().or_else(|| Some(std::env::temp_dir())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePath {
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Candidate locations for config, data, cache and runtime files.
///
/// Each category is discovered on first use and then cached for the life
/// of this value.
#[derive(Debug)]
pub struct PathDiscovery {
    app_name: String,
    config_file_name: String,
    config: OnceLock<Vec<CandidatePath>>,
    data: OnceLock<Vec<CandidatePath>>,
    cache: OnceLock<Vec<CandidatePath>>,
    runtime: OnceLock<Vec<CandidatePath>>,
}

impl Default for PathDiscovery {
    fn default() -> Self {
        Self::new(APP_NAME, CONFIG_FILE_NAME)
    }
}

impl PathDiscovery {
    pub fn new(app_name: impl Into<String>, config_file_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            config_file_name: config_file_name.into(),
            config: OnceLock::new(),
            data: OnceLock::new(),
            cache: OnceLock::new(),
            runtime: OnceLock::new(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// `WTINVENTORY_CONFIG`, `WTINVENTORY_DATA`, ...
    pub fn env_key(&self, category: PathCategory) -> String {
        format!(
            "{}_{}",
            self.app_name.to_uppercase(),
            category.env_suffix()
        )
    }

    /// Candidates for `category`, highest precedence first.
    pub fn candidates(&self, category: PathCategory) -> &[CandidatePath] {
        let cell = match category {
            PathCategory::Config => &self.config,
            PathCategory::Data => &self.data,
            PathCategory::Cache => &self.cache,
            PathCategory::Runtime => &self.runtime,
        };
        cell.get_or_init(|| self.discover(category))
    }

    /// First candidate that exists on disk.
    pub fn first_existing(&self, category: PathCategory) -> Option<&Path> {
        self.candidates(category)
            .iter()
            .map(|candidate| candidate.path.as_path())
            .find(|path| path.exists())
    }

    fn leaf(&self, category: PathCategory) -> &str {
        match category {
            PathCategory::Config => &self.config_file_name,
            _ => &self.app_name,
        }
    }

    fn discover(&self, category: PathCategory) -> Vec<CandidatePath> {
        let leaf = self.leaf(category);
        let mut candidates: Vec<CandidatePath> = Vec::with_capacity(5);
        let mut push = |kind: SourceKind, path: PathBuf| {
            if !candidates.iter().any(|c| c.path == path) {
                candidates.push(CandidatePath { kind, path });
            }
        };

        if let Some(path) = env_path(&self.env_key(category)) {
            push(SourceKind::EnvOverride, path);
        }

        if let Some(dir) = env_path(category.xdg_var()).or_else(|| category.platform_dir()) {
            let base = dir.join(&self.app_name);
            let path = match category {
                PathCategory::Config => base.join(leaf),
                _ => base,
            };
            push(SourceKind::UserDir, path);
        }

        if let Some(home) = dirs::home_dir() {
            push(SourceKind::Home, home.join(leaf));
        }

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            push(SourceKind::ExecutableDir, dir.join(leaf));
        }

        if let Ok(cwd) = std::env::current_dir() {
            push(SourceKind::WorkingDir, cwd.join(leaf));
        }

        candidates
    }
}

/// A non-empty environment variable as a path.
fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
