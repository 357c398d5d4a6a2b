//! The seam between `vodkeep-api` (routing) and `vodkeep-app` (scheduler,
//! worker pool, store). Mirrors the donor's split between its inspector
//! trait and the HTTP layer: the HTTP crate never depends on the app
//! crate directly, only on this trait object, so the two can be compiled
//! and tested independently.

use async_trait::async_trait;
use vodkeep_domain::{Job, JobListQuery, JobPage, StatusCounts};
use vodkeep_extractor::{ProbeInfo, RuntimeDiagnostics};

use crate::ControlPlaneError;

/// Every operation spec.md §4.4 names, as a thin async trait the HTTP
/// layer calls into. Implemented by `vodkeep-app`'s control-plane
/// adapter, which wraps the store plus worker-pool signalling.
#[async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    /// Validate `url`/`preset` and create a `queued` row (spec.md §4.4).
    async fn enqueue(&self, url: &str, preset: &str) -> Result<Job, ControlPlaneError>;

    /// Read-through lookup by id.
    async fn get(&self, id: &str) -> Result<Job, ControlPlaneError>;

    /// Read-through lookup by a media or thumbnail filename (legacy
    /// `POST /delete filename=...` path, spec.md §6.2).
    async fn get_by_filename(&self, filename: &str) -> Result<Job, ControlPlaneError>;

    /// Paginated, filtered, sorted job listing (spec.md §4.1).
    async fn list(&self, query: JobListQuery) -> Result<JobPage, ControlPlaneError>;

    /// Pause a queued or active job (spec.md §4.4). Active jobs are
    /// cancelled cooperatively; the returned job may still show
    /// `downloading` momentarily if the worker has not yet unwound.
    async fn pause(&self, id: &str) -> Result<Job, ControlPlaneError>;

    /// Resume a paused job back to `queued`.
    async fn resume(&self, id: &str) -> Result<Job, ControlPlaneError>;

    /// Retry a failed or paused job, incrementing `attempt_max` by one.
    async fn retry(&self, id: &str) -> Result<Job, ControlPlaneError>;

    /// Cancel if active, delete the row, and best-effort remove on-disk
    /// artifacts. Returns the job as it stood immediately before deletion.
    async fn delete(&self, id: &str) -> Result<Job, ControlPlaneError>;

    /// Resolve a URL's title/extension without enqueuing a download
    /// (§11 probe endpoint).
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ControlPlaneError>;

    /// Resolved extractor runtime diagnostics (§11).
    async fn diagnostics(&self) -> RuntimeDiagnostics;

    /// Per-status job counts, used by the gallery view and diagnostics.
    async fn status_counts(&self) -> Result<StatusCounts, ControlPlaneError>;

    /// Probe the store with a throwaway insert+delete (spec.md §4.1,
    /// used by `GET /readyz`).
    async fn check_store_read_write(&self) -> Result<(), ControlPlaneError>;
}
