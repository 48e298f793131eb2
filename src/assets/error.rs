//! Asset pipeline errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling, resolving or serving assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The tag helper could not resolve a template reference.
    #[error("Asset '{path}' not found in {location}")]
    TagNotFound {
        /// Logical path that was requested.
        path: String,
        /// Human-readable description of where the lookup searched.
        location: String,
    },

    /// A `require` directive or `asset-url` reference names a missing asset.
    #[error("'{dependency}' required by '{asset}' could not be found")]
    MissingDependency { asset: String, dependency: String },

    /// Two or more assets require each other.
    #[error("Circular dependency while compiling '{0}'")]
    CircularDependency(String),

    /// Filesystem access failed.
    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON could not be parsed or written.
    #[error("Invalid manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A precompile pattern is not a valid glob.
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, String),

    /// The `[assets]` configuration is inconsistent.
    #[error("Invalid assets configuration: {0}")]
    Config(String),

    /// Flush-mode lookup before the eager build populated the manifest.
    #[error("Asset manifest has not been loaded yet, run the eager build first")]
    ManifestNotLoaded,

    /// No compressor is registered under this name.
    #[error("Unknown compressor '{0}'")]
    UnknownCompressor(String),

    /// The blocking build task panicked or was cancelled.
    #[error("Asset build task failed: {0}")]
    Task(String),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;
