use companion_registry::RegistryError;
use std::error::Error as StdError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Unexpected status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ConnectorError {
    /// Connectivity failure that happened before the server could act on the request
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Connection(_) => true,
            ConnectorError::Http(err) => {
                err.is_connect() || (err.is_request() && err.status().is_none()) || caused_by_reset(err)
            }
            ConnectorError::Io(err) => is_reset_kind(err.kind()),
            _ => false,
        }
    }
}

fn is_reset_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe
    )
}

/// Walk the source chain looking for a reset connection
fn caused_by_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current = err.source();
    while let Some(cause) = current {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if is_reset_kind(io_err.kind()) {
                return true;
            }
        }
        current = cause.source();
    }
    false
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;
