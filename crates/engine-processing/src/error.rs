use engine_core::error::OperationError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// The consumer's interrupt token fired while waiting for a chunk.
    /// The iterator is left as it was before the call.
    #[error("Interrupted while waiting for the next chunk")]
    Interrupted,

    /// The streaming operation failed; every chunk delivered before the
    /// failure has already been returned.
    #[error("Streaming operation failed: {0}")]
    Operation(#[source] Arc<OperationError>),
}
