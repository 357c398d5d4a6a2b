//! Crate-level error type for `vodkeep-domain`.

use thiserror::Error;

/// Errors raised while constructing or validating domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A preset identifier was not one of the enumerated presets.
    #[error("unknown preset: {preset}")]
    UnknownPreset {
        /// The raw preset string supplied by the caller.
        preset: String,
    },
    /// A submitted URL did not carry an `http(s)://` scheme.
    #[error("url must start with http:// or https://: {url}")]
    InvalidUrl {
        /// The raw URL string supplied by the caller.
        url: String,
    },
    /// A path escaped the configured storage root.
    #[error("path escapes storage root: {path}")]
    PathEscapesRoot {
        /// The offending relative path.
        path: String,
    },
}
