use std::io;

use henkan_core::dict::DictError;
use henkan_core::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{context}: {source}")]
    Data {
        context: String,
        #[source]
        source: DictError,
    },

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Attach what was being done to a data error.
pub(crate) trait Context<T> {
    fn context(self, what: impl Into<String>) -> Result<T, CliError>;
}

impl<T> Context<T> for Result<T, DictError> {
    fn context(self, what: impl Into<String>) -> Result<T, CliError> {
        self.map_err(|source| CliError::Data {
            context: what.into(),
            source,
        })
    }
}
