use thiserror::Error;

/// Errors surfaced by the fetch collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure from the HTTP stack.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status that is not retryable.
    #[error("API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The rate-limit retry budget is exhausted.
    #[error("rate limited: gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, ClientError>;
