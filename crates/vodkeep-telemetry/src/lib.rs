#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the vodkeep workspace.
//!
//! Layout: `init.rs` (logging setup), `metrics.rs` (the Prometheus
//! registry named in spec §6.5), `error.rs` (shared error type).

mod error;
mod init;
mod metrics;

pub use error::TelemetryError;
pub use init::{build_sha, init_logging, LogFormat, LoggingConfig, DEFAULT_LOG_LEVEL};
pub use metrics::Metrics;
