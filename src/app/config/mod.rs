mod cli;
pub mod discovery;
pub mod groups;
pub mod resolver;
mod snapshot;
mod validation;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Command line error: {0}")]
    Cli(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error(
        "neither CLIPath nor WebServerAddress were set. Either one or the other must be specified"
    )]
    NoServerTarget,
    #[error(
        "both CLIPath ({cli_path}) and WebServerAddress ({web_server_address}) were set. Only one may be specified"
    )]
    ConflictingServerTargets {
        cli_path: String,
        web_server_address: String,
    },
}

pub use cli::Cli;
pub use discovery::{CandidatePath, PathCategory, PathDiscovery, SourceKind};
pub use groups::{OutputConfig, RotationConfig};
pub use resolver::{ConfigResolver, ConfigSource, Resolution, SourceOutcome, SourceReport};
pub use snapshot::ConfigSnapshot;
pub use validation::ServerTarget;
