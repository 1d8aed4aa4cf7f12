use engine_config::error::SettingsError;
use engine_core::error::FutureError;
use engine_processing::error::StreamError;
use thiserror::Error;

/// Errors surfaced by command execution and node setup.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Stream settings were rejected.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// The result stream was interrupted or its operation failed.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// A single-shot operation failed, was cancelled or timed out.
    #[error("Operation error: {0}")]
    Future(#[from] FutureError),

    /// A seed document could not be parsed.
    #[error("Invalid seed: {0}")]
    Seed(#[from] serde_json::Error),
}
