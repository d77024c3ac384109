//! # Registry Error Types

use sylva_lod::LodError;
use thiserror::Error;

use crate::registry::ProxyTypeId;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors from the renderer registry and its configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No renderer is registered under this id.
    #[error("unknown proxy type {0}")]
    UnknownType(ProxyTypeId),

    /// A renderer is already registered under this id.
    #[error("proxy type {0} registered twice")]
    DuplicateType(ProxyTypeId),

    /// A configured type has no mesh or materials supplied.
    #[error("no assets supplied for proxy type {0}")]
    MissingAssets(ProxyTypeId),

    /// A renderer rejected its input or lost a build.
    #[error("lod error: {0}")]
    Lod(#[from] LodError),

    /// Registry configuration is invalid.
    #[error("invalid registry config: {0}")]
    Config(String),

    /// Registry configuration failed to parse.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
