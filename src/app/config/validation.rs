use super::ConfigError;
use super::snapshot::ConfigSnapshot;
use std::path::PathBuf;

/// How the server reaches the inventory backend. Exactly one is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    Executable(PathBuf),
    Remote(String),
}

impl ConfigSnapshot {
    /// Check the "exactly one of CLIPath / WebServerAddress" rule.
    ///
    /// A value set to an empty string still counts as set.
    pub fn server_target(&self) -> Result<ServerTarget, ConfigError> {
        match (&self.cli_path, &self.web_server_address) {
            (Some(cli_path), None) => Ok(ServerTarget::Executable(cli_path.clone())),
            (None, Some(address)) => Ok(ServerTarget::Remote(address.clone())),
            (None, None) => Err(ConfigError::NoServerTarget),
            (Some(cli_path), Some(address)) => Err(ConfigError::ConflictingServerTargets {
                cli_path: cli_path.display().to_string(),
                web_server_address: address.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_target() {
        let exe = ConfigSnapshot {
            cli_path: Some(PathBuf::from("/bin/tool")),
            ..ConfigSnapshot::default()
        };
        assert_eq!(
            exe.server_target().unwrap(),
            ServerTarget::Executable(PathBuf::from("/bin/tool"))
        );

        let remote = ConfigSnapshot {
            web_server_address: Some("http://localhost:8080".to_string()),
            ..ConfigSnapshot::default()
        };
        assert_eq!(
            remote.server_target().unwrap(),
            ServerTarget::Remote("http://localhost:8080".to_string())
        );
    }

    #[test]
    fn test_neither_target_is_rejected() {
        let result = ConfigSnapshot::default().server_target();
        assert!(matches!(result, Err(ConfigError::NoServerTarget)));
    }

    #[test]
    fn test_both_targets_are_rejected() {
        let both = ConfigSnapshot {
            cli_path: Some(PathBuf::from("/bin/tool")),
            web_server_address: Some(String::new()),
            ..ConfigSnapshot::default()
        };
        let err = both.server_target().unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingServerTargets { .. }));
        assert!(err.to_string().contains("/bin/tool"));
    }
}
