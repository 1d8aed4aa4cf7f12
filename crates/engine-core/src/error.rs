use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// Failure cause recorded on a future when the underlying operation fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Node '{node}' failed: {message}")]
    Node { node: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to encode or decode a message: {0}")]
    Encoding(String),

    #[error("Operation aborted: {0}")]
    Aborted(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Raised by `get` when a settled future holds no usable value.
#[derive(Error, Debug, Clone)]
pub enum FutureError {
    #[error("Operation failed: {0}")]
    Failed(#[source] Arc<OperationError>),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Timed out after {0:?} waiting for the operation to settle")]
    Timeout(Duration),
}

impl FutureError {
    pub fn cause(&self) -> Option<&Arc<OperationError>> {
        match self {
            FutureError::Failed(cause) => Some(cause),
            _ => None,
        }
    }
}
