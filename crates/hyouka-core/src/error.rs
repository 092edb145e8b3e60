use thiserror::Error;

/// Errors that can occur in the hyouka core pipeline.
#[derive(Debug, Error)]
pub enum HyoukaError {
    /// A genre token matched neither a known ID nor a known name.
    #[error("unknown genre token: {token:?}")]
    UnknownGenre {
        /// The token that failed to resolve.
        token: String,
    },

    /// No record carries both a mean score and a positive vote count,
    /// so the prior mean is undefined for this batch.
    #[error("insufficient data: no record has both a score and votes")]
    InsufficientData,

    /// The prior weight and a record's vote count are both zero, leaving
    /// the shrinkage denominator empty.
    #[error("degenerate prior: prior weight and vote count are both zero")]
    DegeneratePrior,
}

/// Result type alias for core pipeline operations.
pub type Result<T> = std::result::Result<T, HyoukaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = HyoukaError::UnknownGenre {
            token: "Acton".into(),
        };
        assert!(err.to_string().contains("Acton"));

        let err = HyoukaError::InsufficientData;
        assert!(err.to_string().contains("insufficient data"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HyoukaError>();
    }
}
