use thiserror::Error;

/// Errors raised while assembling stream settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// An environment variable held something other than an unsigned integer.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    /// A setting that must be positive was zero.
    #[error("Setting `{0}` must be greater than zero")]
    Zero(&'static str),
}
