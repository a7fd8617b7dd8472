//! Error types for the CLI

use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] companion_config::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] companion_registry::RegistryError),

    #[error("{0}")]
    Connector(#[from] companion_connectors::ConnectorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{service} is not connected ({status}){message}")]
    NotConnected {
        service: &'static str,
        status: String,
        message: String,
    },

    #[error("{0} failed")]
    OperationFailed(String),

    #[error("General error: {0}")]
    General(String),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::General(format!("{:#}", err))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
