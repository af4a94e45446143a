use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("sensor boot failed: {0}")]
    Boot(String),
    #[error("no target in range")]
    OutOfRange,
    #[error("data-ready timeout")]
    DataReadyTimeout,
}

pub type Result<T> = std::result::Result<T, HwError>;
