use thiserror::Error;

/// Errors surfaced by API-backed operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status. `message` carries the
    /// server-supplied message when one was parseable, otherwise a generic
    /// fallback.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Rejected client-side, before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }
}

/// Errors from the durable local store. Callers treat failed reads as
/// "value absent" and never propagate these past the state containers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not locate a data directory")]
    NoDataDir,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
