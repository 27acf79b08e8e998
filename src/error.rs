//! Tokenmeter error types

/// Tokenmeter error types
#[derive(Debug, thiserror::Error)]
pub enum TokenmeterError {
    // Payload errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Backend errors
    /// A name was published twice in the lightweight backend.
    #[error("variable already published: {0}")]
    DuplicateVar(String),

    #[error("backend error ({backend}): {message}")]
    Backend { backend: String, message: String },
}

impl TokenmeterError {
    /// Whether this error came from decoding a response payload.
    ///
    /// Parse failures are non-fatal: the pipeline still calculates and
    /// records whatever the timestamps and sizes allow.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, TokenmeterError::Json(_))
    }

    pub(crate) fn backend(backend: &str, message: impl Into<String>) -> Self {
        TokenmeterError::Backend {
            backend: backend.to_owned(),
            message: message.into(),
        }
    }
}

/// Result type alias for Tokenmeter operations
pub type Result<T> = std::result::Result<T, TokenmeterError>;
