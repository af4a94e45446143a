use thiserror::Error;

/// Faults reported by the ranging source, as seen by the channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SenseError {
    #[error("ranging sensor not initialized")]
    NotInitialized,
    #[error("sensor bring-up failed: {0}")]
    Boot(String),
    #[error("no target in range")]
    NoTarget,
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("hardware error: {0}")]
    Hardware(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing ranging source")]
    MissingSource,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
