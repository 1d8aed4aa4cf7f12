use engine_config::error::SettingsError;
use engine_core::error::FutureError;
use engine_processing::error::StreamError;
use engine_runtime::error::RuntimeError;
use model::pagination::continuation::ContinuationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the seed file: {0}")]
    SeedRead(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to run the command: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Result stream failed: {0}")]
    Stream(#[from] StreamError),

    #[error("Operation failed: {0}")]
    Operation(#[from] FutureError),

    #[error("Invalid continuation: {0}")]
    Continuation(#[from] ContinuationError),

    #[error("Invalid term {value:?} for integer index {index}")]
    InvalidTerm { index: String, value: String },

    #[error("Either --match or both --start and --end are required")]
    MissingRange,

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

impl CliError {
    /// True when the command stopped because of Ctrl+C or SIGTERM.
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            CliError::Stream(StreamError::Interrupted)
                | CliError::Runtime(RuntimeError::Stream(StreamError::Interrupted))
        )
    }
}
