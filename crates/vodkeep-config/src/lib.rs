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

//! Static, process-lifetime configuration (spec §6.4).
//!
//! There is no dynamic, DB-backed configuration service here: every
//! setting is read once from the environment at startup via [`from_env`]
//! and held for the life of the process.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::from_env;
pub use model::{Settings, MIN_PROGRESS_FLUSH_INTERVAL};
