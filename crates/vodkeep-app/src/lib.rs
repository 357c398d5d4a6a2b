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
#![allow(clippy::module_name_repetitions)]

//! Application wiring: the scheduler, the worker, the control-plane
//! adapter, and the boot sequence that ties them to the store, the
//! extractor, and the HTTP layer.

mod active;
mod bootstrap;
mod control_plane;
mod error;
mod metadata;
mod recovery;
mod scheduler;
mod worker;

pub use active::ActiveMap;
pub use bootstrap::run_app;
pub use control_plane::AppControlPlane;
pub use error::{AppError, AppResult};
