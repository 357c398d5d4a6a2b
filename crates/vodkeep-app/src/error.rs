//! Application-level error type for bootstrap and orchestration.
//!
//! # Design
//! - Centralise startup errors; keep each variant's message constant while
//!   carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type, surfaced only at process bootstrap.
/// Once the scheduler and HTTP server are running, failures are handled
/// per-job (spec §7) rather than propagated here.
#[derive(Debug, Error)]
pub enum AppError {
    /// Reading the static environment configuration failed.
    #[error("configuration failed to load")]
    Config {
        /// Source configuration error.
        #[source]
        source: vodkeep_config::ConfigError,
    },
    /// Opening or migrating the SQLite store failed.
    #[error("store failed to open")]
    Store {
        /// Source store error.
        #[source]
        source: vodkeep_store::StoreError,
    },
    /// Preparing the storage root failed.
    #[error("storage root unavailable")]
    FsOps {
        /// Source fsops error.
        #[source]
        source: vodkeep_fsops::FsOpsError,
    },
    /// Constructing the metrics registry failed.
    #[error("telemetry failed to initialise")]
    Telemetry {
        /// Source telemetry error.
        #[source]
        source: vodkeep_telemetry::TelemetryError,
    },
    /// Binding or running the HTTP listener failed.
    #[error("http server failed")]
    Http {
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configured HTTP socket address could not be parsed.
    #[error("invalid http bind address {value:?}")]
    InvalidBindAddr {
        /// The unparsable `host:port` string.
        value: String,
    },
}
