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

//! Shared HTTP DTOs and the `ControlPlane` trait that decouples
//! `vodkeep-api` (routing) from `vodkeep-app` (scheduler, worker pool,
//! store ownership).
//!
//! `vodkeep-api` depends only on this crate and `vodkeep-app` implements
//! [`ControlPlane`] against it, the same split the donor crate draws
//! between its HTTP layer and its torrent workflow/inspector traits.

mod control_plane;
mod dto;
mod error;

pub use control_plane::ControlPlane;
pub use dto::{
    parse_sort, DiagnosticsResponseDto, EnqueueResponseDto, ErrorResponseDto, HealthzResponseDto,
    JobDto, JobListQueryDto, JobListResponseDto, JobResponseDto, PresetDto, ProbeResponseDto,
    ReadyzCheckDto, ReadyzResponseDto, StatusCountsDto,
};
pub use error::ControlPlaneError;
