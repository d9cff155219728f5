use super::ConfigError;
use super::groups::{OutputConfig, RotationConfig};
use super::snapshot::ConfigSnapshot;
use clap::Parser;
use std::path::PathBuf;

/// Command-line flags of the inventory protocol server.
///
/// The four configuration flags are `Option`s so that a flag the user did
/// not pass stays distinguishable from one passed with an empty value.
#[derive(Parser, Debug, Clone)]
#[command(name = "wtinventory-mcp", author, version, about, long_about = None)]
pub struct Cli {
    /// Path on the local filesystem for logging information
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Minimum level to log items (defaults to info if not set)
    #[arg(long)]
    pub min_log_level: Option<String>,

    /// Path for the inventory CLI executable
    #[arg(long)]
    pub cli_path: Option<PathBuf>,

    /// Address for the inventory web server
    #[arg(long)]
    pub web_server_address: Option<String>,

    /// Rotate the log file once it reaches this many megabytes
    #[arg(long, default_value = "100")]
    pub log_max_size_mb: u64,

    /// Number of rotated log files to keep (0 keeps all)
    #[arg(long, default_value = "0")]
    pub log_max_backups: usize,

    /// Delete rotated log files older than this many days (0 disables)
    #[arg(long, default_value = "0")]
    pub log_max_age_days: u64,

    /// Gzip rotated log files
    #[arg(long)]
    pub log_compress: bool,

    /// Do not mirror log output to stderr
    #[arg(long)]
    pub no_console: bool,

    /// Do not forward log events to the connected protocol client
    #[arg(long)]
    pub no_remote_logging: bool,
}

impl Cli {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Cli(e.to_string()))?;
        cli.validate()?;
        Ok(cli)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_max_size_mb == 0 {
            return Err(ConfigError::InvalidConfig(
                "Log max size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The highest-precedence configuration layer: only flags that were
    /// actually supplied are set.
    pub fn overrides(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            log_path: self.log_path.clone(),
            min_log_level: self.min_log_level.clone(),
            cli_path: self.cli_path.clone(),
            web_server_address: self.web_server_address.clone(),
        }
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig {
            console: !self.no_console,
            remote_logging: !self.no_remote_logging,
            rotation: RotationConfig {
                max_size_mb: self.log_max_size_mb,
                max_backups: self.log_max_backups,
                max_age_days: self.log_max_age_days,
                compress: self.log_compress,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupplied_flags_stay_unset() {
        let cli = Cli::from_args(["wtinventory-mcp", "--cli-path", "/bin/tool"]).unwrap();
        let overrides = cli.overrides();

        assert_eq!(overrides.cli_path, Some(PathBuf::from("/bin/tool")));
        assert_eq!(overrides.log_path, None);
        assert_eq!(overrides.min_log_level, None);
        assert_eq!(overrides.web_server_address, None);
    }

    #[test]
    fn test_empty_flag_value_is_set() {
        let cli = Cli::from_args(["wtinventory-mcp", "--web-server-address", ""]).unwrap();
        assert_eq!(cli.overrides().web_server_address.as_deref(), Some(""));
    }

    #[test]
    fn test_output_flags() {
        let cli = Cli::from_args([
            "wtinventory-mcp",
            "--log-max-size-mb",
            "5",
            "--log-max-backups",
            "3",
            "--log-compress",
            "--no-console",
        ])
        .unwrap();
        let output = cli.output();

        assert!(!output.console);
        assert!(output.remote_logging);
        assert_eq!(output.rotation.max_size_mb, 5);
        assert_eq!(output.rotation.max_backups, 3);
        assert!(output.rotation.compress);
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let result = Cli::from_args(["wtinventory-mcp", "--log-max-size-mb", "0"]);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }
}
