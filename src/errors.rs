//! Crate error type.

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid training configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Dataset has no samples")]
    EmptyDataset,

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Failed to write progress: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install logger: {0}")]
    Logger(#[from] SetGlobalDefaultError),
}

pub type Result<T> = std::result::Result<T, Error>;
