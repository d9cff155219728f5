use serial_test::serial;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tempfile::TempDir;
use wtinventory_logging::Severity;
use wtinventory_logging::app::config::{
    Cli, ConfigResolver, ConfigSnapshot, PathDiscovery, ServerTarget, SourceKind, SourceOutcome,
};

const APP: &str = "wtinvtest";
const FILE: &str = "wtinvtest.json";
const ENV_VARS: [&str; 3] = ["WTINVTEST_CONFIG", "XDG_CONFIG_HOME", "HOME"];

/// Temporary layout for every file-based source plus the saved process
/// environment, restored on drop.
struct Layout {
    root: TempDir,
    saved_env: Vec<(&'static str, Option<std::ffi::OsString>)>,
    saved_cwd: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        for dir in ["env", "xdg", "home", "cwd"] {
            fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        fs::create_dir_all(root.path().join("xdg").join(APP)).unwrap();

        let saved_env = ENV_VARS.iter().map(|v| (*v, env::var_os(v))).collect();
        let saved_cwd = env::current_dir().unwrap();

        unsafe {
            env::set_var("WTINVTEST_CONFIG", root.path().join("env").join(FILE));
            env::set_var("XDG_CONFIG_HOME", root.path().join("xdg"));
            env::set_var("HOME", root.path().join("home"));
        }
        env::set_current_dir(root.path().join("cwd")).unwrap();

        Self {
            root,
            saved_env,
            saved_cwd,
        }
    }

    fn path(&self, source: SourceKind) -> PathBuf {
        let base = self.root.path();
        match source {
            SourceKind::EnvOverride => base.join("env").join(FILE),
            SourceKind::UserDir => base.join("xdg").join(APP).join(FILE),
            SourceKind::Home => base.join("home").join(FILE),
            SourceKind::WorkingDir => base.join("cwd").join(FILE),
            SourceKind::ExecutableDir => panic!("executable dir is not controllable in tests"),
        }
    }

    fn write(&self, source: SourceKind, content: &str) {
        fs::write(self.path(source), content).unwrap();
    }

    fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(PathDiscovery::new(APP, FILE))
    }
}

impl Drop for Layout {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.saved_cwd);
        unsafe {
            for (name, value) in &self.saved_env {
                match value {
                    Some(value) => env::set_var(name, value),
                    None => env::remove_var(name),
                }
            }
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[test]
#[serial]
fn test_sources_are_discovered_in_precedence_order() {
    let layout = Layout::new();
    let resolver = layout.resolver();
    let sources = resolver.sources();

    let kinds: Vec<SourceKind> = sources.iter().map(|s| s.kind).collect();
    assert_eq!(kinds[0], SourceKind::EnvOverride);
    assert_eq!(kinds[1], SourceKind::UserDir);
    assert_eq!(kinds[2], SourceKind::Home);
    assert_eq!(*kinds.last().unwrap(), SourceKind::WorkingDir);

    assert!(same_file(&sources[0].path, &layout.path(SourceKind::EnvOverride)));
    assert!(same_file(&sources[1].path, &layout.path(SourceKind::UserDir)));
    assert!(same_file(&sources[2].path, &layout.path(SourceKind::Home)));
}

#[test]
#[serial]
fn test_home_and_cwd_layers_merge_first_writer_wins() {
    let layout = Layout::new();
    layout.write(SourceKind::Home, r#"{"MinLogLevel":"Warning"}"#);
    layout.write(
        SourceKind::WorkingDir,
        r#"{"MinLogLevel":"Debug","CLIPath":"/bin/tool"}"#,
    );

    let resolution = layout.resolver().resolve(ConfigSnapshot::default());

    assert_eq!(resolution.snapshot.min_log_level.as_deref(), Some("Warning"));
    assert_eq!(resolution.snapshot.min_severity(), Severity::Warning);
    assert_eq!(resolution.snapshot.cli_path, Some(PathBuf::from("/bin/tool")));
    assert_eq!(
        resolution.snapshot.server_target().unwrap(),
        ServerTarget::Executable(PathBuf::from("/bin/tool"))
    );
}

#[test]
#[serial]
fn test_every_layer_in_order() {
    let layout = Layout::new();
    layout.write(SourceKind::EnvOverride, r#"{"LogPath":"/tmp/env.log"}"#);
    layout.write(
        SourceKind::UserDir,
        r#"{"LogPath":"/tmp/xdg.log","MinLogLevel":"error"}"#,
    );
    layout.write(
        SourceKind::Home,
        r#"{"MinLogLevel":"debug","WebServerAddress":"http://home:8080"}"#,
    );
    layout.write(
        SourceKind::WorkingDir,
        r#"{"WebServerAddress":"http://cwd:8080","LogPath":"/tmp/cwd.log"}"#,
    );

    let resolution = layout.resolver().resolve(ConfigSnapshot::default());
    let snapshot = &resolution.snapshot;

    assert_eq!(snapshot.log_path, Some(PathBuf::from("/tmp/env.log")));
    assert_eq!(snapshot.min_log_level.as_deref(), Some("error"));
    assert_eq!(
        snapshot.web_server_address.as_deref(),
        Some("http://home:8080")
    );
    assert_eq!(snapshot.cli_path, None);

    let merged: Vec<(SourceKind, Vec<&str>)> = resolution
        .report
        .iter()
        .filter_map(|entry| match &entry.outcome {
            SourceOutcome::Merged { fields } => Some((entry.source.kind, fields.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        merged,
        vec![
            (SourceKind::EnvOverride, vec!["LogPath"]),
            (SourceKind::UserDir, vec!["MinLogLevel"]),
            (SourceKind::Home, vec!["WebServerAddress"]),
            (SourceKind::WorkingDir, vec![]),
        ]
    );
}

#[test]
#[serial]
fn test_flags_override_files() {
    let layout = Layout::new();
    layout.write(
        SourceKind::UserDir,
        r#"{"MinLogLevel":"error","CLIPath":"/bin/from-file"}"#,
    );

    let cli = Cli::from_args([
        "wtinventory-mcp",
        "--min-log-level",
        "notice",
        "--cli-path",
        "/bin/from-flag",
    ])
    .unwrap();
    let resolution = layout.resolver().resolve(cli.overrides());

    assert_eq!(resolution.snapshot.min_severity(), Severity::Notice);
    assert_eq!(
        resolution.snapshot.cli_path,
        Some(PathBuf::from("/bin/from-flag"))
    );
}

#[test]
#[serial]
fn test_unparsable_layer_is_skipped_not_partially_applied() {
    let layout = Layout::new();
    layout.write(SourceKind::EnvOverride, r#"{"CLIPath": "/bin/partial", "#);
    layout.write(SourceKind::Home, r#"{"WebServerAddress":"http://home:8080"}"#);

    let resolution = layout.resolver().resolve(ConfigSnapshot::default());

    assert_eq!(resolution.snapshot.cli_path, None);
    assert_eq!(
        resolution.snapshot.server_target().unwrap(),
        ServerTarget::Remote("http://home:8080".to_string())
    );
    assert!(matches!(
        resolution.report[0].outcome,
        SourceOutcome::Unparsable { .. }
    ));
}

#[test]
#[serial]
fn test_no_sources_means_defaults() {
    let layout = Layout::new();
    let resolution = layout.resolver().resolve(ConfigSnapshot::default());

    assert!(resolution.snapshot.is_empty());
    assert_eq!(resolution.snapshot.min_severity(), Severity::Info);
    assert!(!resolution.snapshot.is_debug_mode());
    assert!(resolution.snapshot.server_target().is_err());
}
