use crate::app::config::ConfigError;
use crate::logger::LoggerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logger(#[from] LoggerError),

    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(String),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}
