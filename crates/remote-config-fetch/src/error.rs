/// Errors surfaced by configuration fetches and lookups.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Same session, attempt count at or over the configured maximum.
    #[error("remote config fetch rejected due to exceeded retry count")]
    RetryExhausted,

    /// The fetch deadline elapsed before the sequence completed.
    #[error("remote config fetch rejected due to timeout after {} seconds", .0.as_secs_f64())]
    Timeout(std::time::Duration),

    /// Status neither successful nor a recoverable failure.
    #[error("network error occurred, remote config fetch failed (status {0})")]
    UnexpectedStatus(u16),

    /// Transport failure unrelated to the deadline.
    #[error("{0}")]
    Request(String),

    /// Body or namespace config could not be decoded.
    #[error("failed to decode remote config response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The default HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Fallback message for transport failures without a description.
pub(crate) const UNEXPECTED_ERROR_MESSAGE: &str = "unexpected error occurred";

impl FetchError {
    /// Builds a [`FetchError::Request`] from a transport message.
    pub(crate) fn request(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::Request(UNEXPECTED_ERROR_MESSAGE.to_string())
        } else {
            Self::Request(message)
        }
    }
}
