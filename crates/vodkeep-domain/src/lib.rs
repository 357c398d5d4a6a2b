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

//! Core job/attempt domain types shared by the store, worker, and control
//! plane. This crate has no I/O of its own; it only defines the shapes the
//! rest of the workspace agrees on.

mod error;
mod model;

pub use error::DomainError;
pub use model::{
    all_presets, Attempt, AttemptStatus, Job, JobListQuery, JobPage, JobStatus, Preset,
    RuntimeProfile, SortOrder, StatusCounts,
};
