//! Wire types for the HTTP control plane (spec.md §6.2). Kept distinct
//! from `vodkeep_domain::Job` so the storage representation can evolve
//! without touching the public response shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vodkeep_domain::{Job, JobPage, JobStatus, Preset, RuntimeProfile, SortOrder, StatusCounts};
use vodkeep_extractor::{ProbeInfo, RuntimeDiagnostics};

/// A [`Job`] as rendered over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDto {
    /// See [`Job::id`].
    pub id: String,
    /// See [`Job::requested_url`].
    pub requested_url: String,
    /// See [`Job::preset`].
    pub preset: Preset,
    /// See [`Job::created_at`].
    pub created_at: DateTime<Utc>,
    /// See [`Job::canonical_url`].
    pub canonical_url: Option<String>,
    /// See [`Job::webpage_url`].
    pub webpage_url: Option<String>,
    /// See [`Job::video_id`].
    pub video_id: Option<String>,
    /// See [`Job::extractor`].
    pub extractor: Option<String>,
    /// See [`Job::extractor_key`].
    pub extractor_key: Option<String>,
    /// See [`Job::title`].
    pub title: Option<String>,
    /// See [`Job::uploader`].
    pub uploader: Option<String>,
    /// See [`Job::uploader_id`].
    pub uploader_id: Option<String>,
    /// See [`Job::channel`].
    pub channel: Option<String>,
    /// See [`Job::channel_id`].
    pub channel_id: Option<String>,
    /// See [`Job::duration_seconds`].
    pub duration_seconds: Option<f64>,
    /// See [`Job::upload_date`].
    pub upload_date: Option<String>,
    /// See [`Job::thumbnail_remote_url`].
    pub thumbnail_remote_url: Option<String>,
    /// See [`Job::media_local_path`].
    pub media_local_path: Option<String>,
    /// See [`Job::media_ext`].
    pub media_ext: Option<String>,
    /// See [`Job::thumbnail_local_path`].
    pub thumbnail_local_path: Option<String>,
    /// See [`Job::status`].
    pub status: JobStatus,
    /// See [`Job::queued_at`].
    pub queued_at: Option<DateTime<Utc>>,
    /// See [`Job::started_at`].
    pub started_at: Option<DateTime<Utc>>,
    /// See [`Job::paused_at`].
    pub paused_at: Option<DateTime<Utc>>,
    /// See [`Job::completed_at`].
    pub completed_at: Option<DateTime<Utc>>,
    /// See [`Job::failed_at`].
    pub failed_at: Option<DateTime<Utc>>,
    /// See [`Job::updated_at`].
    pub updated_at: DateTime<Utc>,
    /// See [`Job::progress_percent`].
    pub progress_percent: Option<f64>,
    /// See [`Job::downloaded_bytes`].
    pub downloaded_bytes: i64,
    /// See [`Job::total_bytes`].
    pub total_bytes: Option<i64>,
    /// See [`Job::speed_bps`].
    pub speed_bps: Option<f64>,
    /// See [`Job::eta_seconds`].
    pub eta_seconds: Option<i64>,
    /// See [`Job::attempt_current`].
    pub attempt_current: i32,
    /// See [`Job::attempt_max`].
    pub attempt_max: i32,
    /// See [`Job::runtime_profile`].
    pub runtime_profile: RuntimeProfile,
    /// See [`Job::last_exception_type`].
    pub last_exception_type: Option<String>,
    /// See [`Job::error_message`].
    pub error_message: Option<String>,
    /// See [`Job::metadata_json`].
    pub metadata_json: Option<String>,
}

impl From<Job> for JobDto {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            requested_url: job.requested_url,
            preset: job.preset,
            created_at: job.created_at,
            canonical_url: job.canonical_url,
            webpage_url: job.webpage_url,
            video_id: job.video_id,
            extractor: job.extractor,
            extractor_key: job.extractor_key,
            title: job.title,
            uploader: job.uploader,
            uploader_id: job.uploader_id,
            channel: job.channel,
            channel_id: job.channel_id,
            duration_seconds: job.duration_seconds,
            upload_date: job.upload_date,
            thumbnail_remote_url: job.thumbnail_remote_url,
            media_local_path: job.media_local_path,
            media_ext: job.media_ext,
            thumbnail_local_path: job.thumbnail_local_path,
            status: job.status,
            queued_at: job.queued_at,
            started_at: job.started_at,
            paused_at: job.paused_at,
            completed_at: job.completed_at,
            failed_at: job.failed_at,
            updated_at: job.updated_at,
            progress_percent: job.progress_percent,
            downloaded_bytes: job.downloaded_bytes,
            total_bytes: job.total_bytes,
            speed_bps: job.speed_bps,
            eta_seconds: job.eta_seconds,
            attempt_current: job.attempt_current,
            attempt_max: job.attempt_max,
            runtime_profile: job.runtime_profile,
            last_exception_type: job.last_exception_type,
            error_message: job.error_message,
            metadata_json: job.metadata_json,
        }
    }
}

/// Body of `POST /download` and the legacy enqueue path on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponseDto {
    /// Always `true`; failures are distinct response shapes.
    pub ok: bool,
    /// The newly created job's id.
    pub job_id: String,
    /// The preset the job was enqueued with.
    pub preset: Preset,
    /// Always `queued` immediately after enqueue.
    pub status: JobStatus,
}

impl EnqueueResponseDto {
    /// Build the success body for a freshly enqueued job.
    #[must_use]
    pub fn from_job(job: &Job) -> Self {
        Self {
            ok: true,
            job_id: job.id.clone(),
            preset: job.preset,
            status: job.status,
        }
    }
}

/// Body of `GET /api/status/<id>` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponseDto {
    /// Always `true` on this path; errors use [`ErrorResponseDto`].
    pub ok: bool,
    /// The job.
    pub job: JobDto,
}

impl From<Job> for JobResponseDto {
    fn from(job: Job) -> Self {
        Self {
            ok: true,
            job: job.into(),
        }
    }
}

/// The literal `{ok:false, error:"..."}` shape spec.md §8 scenario 2 names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    /// Always `false`.
    pub ok: bool,
    /// Stable error token, e.g. `invalid_preset`.
    pub error: String,
}

impl ErrorResponseDto {
    /// Build the body from a stable error token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: token.into(),
        }
    }
}

/// Body of `GET /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponseDto {
    /// Jobs on this page.
    pub jobs: Vec<JobDto>,
    /// Total rows matching the filter, across all pages.
    pub total: i64,
    /// The page number served.
    pub page: u32,
    /// The page size served.
    pub per_page: u32,
}

impl JobListResponseDto {
    /// Build a response page from a store [`JobPage`].
    #[must_use]
    pub fn new(page: JobPage, requested_page: u32, per_page: u32) -> Self {
        Self {
            jobs: page.jobs.into_iter().map(JobDto::from).collect(),
            total: page.total,
            page: requested_page,
            per_page,
        }
    }
}

/// Query parameters accepted by `GET /api/jobs` before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct JobListQueryDto {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
    /// Optional status filter, by wire id.
    pub status: Option<String>,
    /// Optional substring search term.
    pub q: Option<String>,
    /// Optional sort id.
    pub sort: Option<String>,
    /// Optional exact uploader filter.
    pub uploader: Option<String>,
}

/// One entry of `GET /api/presets`.
#[derive(Debug, Clone, Serialize)]
pub struct PresetDto {
    /// Stable preset id.
    pub id: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// The format selector string the preset resolves to.
    pub format_selector: &'static str,
    /// Whether the preset extracts audio only.
    pub audio_only: bool,
}

impl From<Preset> for PresetDto {
    fn from(preset: Preset) -> Self {
        Self {
            id: preset.id(),
            label: preset.label(),
            format_selector: preset.format_selector(),
            audio_only: preset.is_audio_only(),
        }
    }
}

/// Body of `GET /api/probe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponseDto {
    /// Always `true`; failures use [`ErrorResponseDto`].
    pub ok: bool,
    /// Resolved title, if known without downloading.
    pub title: Option<String>,
    /// Likely file extension for the default preset.
    pub ext: Option<String>,
    /// Extractor-assigned video id.
    pub video_id: Option<String>,
    /// Uploader display name.
    pub uploader: Option<String>,
    /// Duration in seconds.
    pub duration_seconds: Option<f64>,
    /// Remote thumbnail URL.
    pub thumbnail_remote_url: Option<String>,
}

impl From<ProbeInfo> for ProbeResponseDto {
    fn from(info: ProbeInfo) -> Self {
        Self {
            ok: true,
            title: info.title,
            ext: info.ext,
            video_id: info.video_id,
            uploader: info.uploader,
            duration_seconds: info.duration_seconds,
            thumbnail_remote_url: info.thumbnail_remote_url,
        }
    }
}

/// Body of `GET /api/diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsResponseDto {
    /// The JS runtime interpreter name.
    pub js_runtime: String,
    /// Resolved path to the JS runtime interpreter.
    pub js_runtime_path: String,
    /// Resolved `ffmpeg` path, if configured.
    pub ffmpeg_path: Option<String>,
    /// Whether the YouTube fallback profile is enabled.
    pub youtube_fallback_enabled: bool,
    /// Worker pool concurrency ceiling.
    pub max_concurrent_downloads: usize,
}

impl From<RuntimeDiagnostics> for DiagnosticsResponseDto {
    fn from(diag: RuntimeDiagnostics) -> Self {
        Self {
            js_runtime: diag.js_runtime,
            js_runtime_path: diag.js_runtime_path.display().to_string(),
            ffmpeg_path: diag.ffmpeg_path.map(|p| p.display().to_string()),
            youtube_fallback_enabled: diag.youtube_fallback_enabled,
            max_concurrent_downloads: diag.max_concurrent_downloads,
        }
    }
}

/// Body of `GET /healthz`: always `{ok:true}`, 200 (spec.md §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthzResponseDto {
    /// Always `true`.
    pub ok: bool,
}

impl Default for HealthzResponseDto {
    fn default() -> Self {
        Self { ok: true }
    }
}

/// One named check inside [`ReadyzResponseDto`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzCheckDto {
    /// Whether this check passed.
    pub ok: bool,
    /// Human-readable detail, populated on failure.
    pub detail: Option<String>,
}

impl ReadyzCheckDto {
    /// A passing check with no detail.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    /// A failing check with a reason.
    #[must_use]
    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

/// Body of `GET /readyz` (spec.md §6.2): 200 when every check passes,
/// 503 with per-check diagnostics otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyzResponseDto {
    /// `true` iff every check passed.
    pub ok: bool,
    /// Store read-write probe.
    pub database: ReadyzCheckDto,
    /// Storage root writability probe.
    pub storage_writable: ReadyzCheckDto,
    /// Free disk space against `MIN_FREE_DISK_MB`.
    pub free_disk_space: ReadyzCheckDto,
}

impl ReadyzResponseDto {
    /// Whether every constituent check passed.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.database.ok && self.storage_writable.ok && self.free_disk_space.ok
    }
}

/// Body of `GET /metrics`' counterpart `GET /api/status/counts` (internal
/// helper used by the gallery view and diagnostics; not a spec.md route on
/// its own, composed from [`StatusCounts`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountsDto {
    /// Count of `queued` jobs.
    pub queued: i64,
    /// Count of `downloading` jobs.
    pub downloading: i64,
    /// Count of `retrying` jobs.
    pub retrying: i64,
    /// Count of `paused` jobs.
    pub paused: i64,
    /// Count of `completed` jobs.
    pub completed: i64,
    /// Count of `failed` jobs.
    pub failed: i64,
}

impl From<StatusCounts> for StatusCountsDto {
    fn from(counts: StatusCounts) -> Self {
        Self {
            queued: counts.queued,
            downloading: counts.downloading,
            retrying: counts.retrying,
            paused: counts.paused,
            completed: counts.completed,
            failed: counts.failed,
        }
    }
}

/// Parse a wire sort id, matching [`SortOrder::parse`]'s default-on-unknown
/// behaviour.
#[must_use]
pub fn parse_sort(id: Option<&str>) -> SortOrder {
    SortOrder::parse(id)
}
