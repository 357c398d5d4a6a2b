//! Error types for the extractor adapter and worker.

use thiserror::Error;

/// Errors surfaced by an [`crate::adapter::ExtractorAdapter`] implementation.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// The progress hook raised this to unwind the extractor cooperatively
    /// after observing the worker's cancel signal.
    #[error("pause requested")]
    PauseRequested,
    /// The extractor process or library call failed.
    #[error("extraction failed: {message}")]
    Failed {
        /// Human-readable error message, used for retry/failure classification.
        message: String,
        /// Exception/error type name, recorded on the attempt row.
        exception_type: String,
    },
    /// The extractor's stdout could not be parsed as the expected
    /// newline-delimited event protocol.
    #[error("malformed extractor output: {0}")]
    Protocol(String),
    /// Launching or communicating with the extractor process failed.
    #[error("extractor process error: {0}")]
    Process(#[source] std::io::Error),
}

impl ExtractorError {
    /// Build a [`ExtractorError::Failed`] from a message, inferring an
    /// exception type name the way the legacy extractor's own errors are
    /// typically named.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            exception_type: "ExtractorError".to_string(),
        }
    }
}
