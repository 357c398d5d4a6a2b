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

//! Storage-root path resolution and cleanup.
//!
//! Everything a job writes or reads lives under one directory, the
//! storage root. This crate is the single place that decides whether a
//! path is inside it, resolves where an extractor run's artifacts
//! actually landed, and removes them on delete. No crate outside this one
//! should touch the filesystem on the storage root's behalf.

mod cleanup;
mod error;
mod resolve;
mod root;

pub use cleanup::cleanup_job_artifacts;
pub use error::FsOpsError;
pub use resolve::{resolve_artifacts, resolve_media_path, resolve_thumbnail_path, ResolvedArtifacts};
pub use root::StorageRoot;
