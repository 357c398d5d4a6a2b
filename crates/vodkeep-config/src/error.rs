//! Crate-level error type for `vodkeep-config`.

use thiserror::Error;

/// Errors raised while loading static, process-lifetime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {name}")]
    MissingVar {
        /// The variable name.
        name: &'static str,
    },
    /// An environment variable was set but could not be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        /// The variable name.
        name: &'static str,
        /// The raw value that failed to parse.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}
