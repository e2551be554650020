//! Error types for lavabomb.

use std::path::PathBuf;

/// Result type alias for lavabomb operations.
pub type Result<T> = std::result::Result<T, LavaError>;

/// Errors that can occur while building or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum LavaError {
    /// The engine settings are unusable (for example a zero run budget).
    #[error("Invalid engine settings: {0}")]
    Construction(String),

    /// The noise mapping could not be opened or read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path of the mapping that failed
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The noise mapping is malformed or a field has the wrong type.
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        /// Path of the mapping that failed
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A sink could not render a line.
    #[error("Failed to render line: {0}")]
    Render(#[source] std::io::Error),

    /// The engine settings file or environment could not be loaded.
    #[error("Failed to load engine settings: {0}")]
    Settings(#[from] ::config::ConfigError),

    /// A component task panicked or was aborted.
    #[error("Component task failed: {0}")]
    Task(String),
}

impl LavaError {
    /// Shorthand for a [`LavaError::Construction`].
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }
}

impl From<tokio::task::JoinError> for LavaError {
    fn from(err: tokio::task::JoinError) -> Self {
        LavaError::Task(err.to_string())
    }
}
