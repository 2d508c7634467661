use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The manifest could not be obtained at all. Always fatal.
    #[error("Manifest unavailable: {0}")]
    ManifestUnavailable(String),

    #[error("Malformed manifest '{source_name}': {message}")]
    ManifestParse {
        source_name: String,
        message: String,
    },

    #[error("Manifest '{0}' is read-only")]
    ReadOnlyManifest(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error at '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yml::Error),

    #[error("KDL parse error: {0}")]
    KdlError(#[from] kdl::KdlError),

    #[error("System command '{command}' failed: {reason}")]
    SystemCommandFailed { command: String, reason: String },

    #[error("System dependency missing: {0}")]
    DependencyMissing(String),

    /// Remote resource fetch error (HTTP, network, etc.)
    #[error("Failed to fetch remote resource: {0}")]
    RemoteFetchError(String),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Package manager returned exit code {code} for '{id}'")]
    PackageOperation { id: String, code: i32 },

    /// Lock acquisition failed
    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Operation interrupted by user")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
