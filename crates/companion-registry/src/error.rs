//! Error types for action-type resolution

use companion_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Action types are not loaded; call load_types() before resolving")]
    NotLoaded,

    #[error("Unknown plugin action type: {0}")]
    UnknownPlugin(String),

    #[error("Unknown action type: {0}")]
    UnknownType(String),

    #[error("Action type '{0}' has no template for new actions")]
    NoTemplate(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CoreError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
