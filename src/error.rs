//! Error types for stream valves.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for valve operations.
#[derive(Error, Debug)]
pub enum ValveError {
    /// Construction-time validation failed
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The valve must be opened before it can be iterated or closed
    #[error("Valve is not open")]
    NotOpen,

    /// `open()` was called on a valve that is already open
    #[error("Valve is already open")]
    AlreadyOpen,

    /// The underlying source could not be acquired
    #[error("Resource unavailable: {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An extension point was invoked without a concrete implementation
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Settings or configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for valve operations.
pub type Result<T> = std::result::Result<T, ValveError>;
