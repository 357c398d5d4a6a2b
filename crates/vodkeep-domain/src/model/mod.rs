//! Core job/attempt domain types tracked by the store and worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle state of a [`Job`]. Transitions are enforced by the store, not
/// by this type; see the store's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Admitted, waiting for the scheduler to dispatch a worker.
    Queued,
    /// A worker currently holds the logical lease and is driving the
    /// extractor on the primary runtime profile.
    Downloading,
    /// A worker is re-attempting the job on a later profile after a
    /// token-matched, retryable failure.
    Retrying,
    /// Cooperatively paused; no worker holds a lease.
    Paused,
    /// Terminal: the job produced local artifacts.
    Completed,
    /// Terminal: every attempt was exhausted or the error was not
    /// retryable.
    Failed,
}

impl JobStatus {
    /// Whether this status represents a worker actively holding the
    /// in-memory lease implied by the row (`downloading` or `retrying`).
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Downloading | Self::Retrying)
    }

    /// Whether this status is terminal and will never transition again
    /// without an explicit `retry`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Which extractor option bundle an attempt ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeProfile {
    /// Default extractor options.
    Primary,
    /// YouTube-specific alternate player clients, used after a
    /// token-matched primary failure.
    Fallback,
}

impl RuntimeProfile {
    /// Stable string form stored in the database and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RuntimeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status recorded on a single append-only [`Attempt`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The attempt began executing.
    Started,
    /// The attempt finished successfully.
    Completed,
    /// The attempt finished with an error.
    Failed,
    /// The attempt was cooperatively cancelled.
    Paused,
}

impl AttemptStatus {
    /// Stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        }
    }
}

/// The closed set of user-selectable format/quality bundles (§6.1).
///
/// Variants are pinned to their canonical ids explicitly rather than via
/// `rename_all = "snake_case"`: serde's snake_case conversion inserts no
/// underscore before a leading digit, which would serialize
/// `Best1080p` as `"best1080p"` instead of the `"best_1080p"` used
/// everywhere else (storage, `id()`, `parse()`, `GET /api/presets`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Best available video + audio, muxed to mp4.
    #[serde(rename = "best")]
    Best,
    /// Best available capped at 1080p, muxed to mp4.
    #[serde(rename = "best_1080p")]
    Best1080p,
    /// Audio-only extraction to m4a.
    #[serde(rename = "audio_only")]
    AudioOnly,
}

impl Preset {
    /// Parse a preset id, rejecting anything outside the closed set.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownPreset`] for any id not in §6.1.
    pub fn parse(id: &str) -> Result<Self, DomainError> {
        match id {
            "best" => Ok(Self::Best),
            "best_1080p" => Ok(Self::Best1080p),
            "audio_only" => Ok(Self::AudioOnly),
            other => Err(DomainError::UnknownPreset {
                preset: other.to_string(),
            }),
        }
    }

    /// Stable id used in storage, the HTTP surface, and logs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Best1080p => "best_1080p",
            Self::AudioOnly => "audio_only",
        }
    }

    /// Human-readable label (§6.1).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Best => "Best",
            Self::Best1080p => "Best 1080p",
            Self::AudioOnly => "Audio only (M4A)",
        }
    }

    /// The format selector string passed to the extractor adapter.
    #[must_use]
    pub const fn format_selector(self) -> &'static str {
        match self {
            Self::Best => "bestvideo+bestaudio/best",
            Self::Best1080p => {
                "bestvideo[height<=1080]+bestaudio/best[height<=1080]/best"
            }
            Self::AudioOnly => "bestaudio/best",
        }
    }

    /// Whether this preset extracts audio only rather than muxing video.
    #[must_use]
    pub const fn is_audio_only(self) -> bool {
        matches!(self, Self::AudioOnly)
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// The full set of presets, in the order presented by `GET /api/presets`.
#[must_use]
pub const fn all_presets() -> [Preset; 3] {
    [Preset::Best, Preset::Best1080p, Preset::AudioOnly]
}

/// One job: a URL + preset submission tracked end-to-end (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Opaque, collision-resistant, URL-safe identifier assigned on enqueue.
    pub id: String,
    /// The URL exactly as submitted.
    pub requested_url: String,
    /// The selected format/quality bundle.
    pub preset: Preset,
    /// When the row was created.
    pub created_at: DateTime<Utc>,

    /// Extractor-normalised URL, once known.
    pub canonical_url: Option<String>,
    /// The page URL the extractor resolved, once known.
    pub webpage_url: Option<String>,
    /// Extractor-assigned video id.
    pub video_id: Option<String>,
    /// Extractor name (e.g. `youtube`).
    pub extractor: Option<String>,
    /// Extractor-specific key, finer-grained than `extractor`.
    pub extractor_key: Option<String>,
    /// Video title.
    pub title: Option<String>,
    /// Uploader display name.
    pub uploader: Option<String>,
    /// Uploader id.
    pub uploader_id: Option<String>,
    /// Channel display name.
    pub channel: Option<String>,
    /// Channel id.
    pub channel_id: Option<String>,
    /// Duration in seconds, if known.
    pub duration_seconds: Option<f64>,
    /// Upload date as reported by the extractor (`YYYYMMDD` or similar).
    pub upload_date: Option<String>,
    /// Remote thumbnail URL as reported by the extractor.
    pub thumbnail_remote_url: Option<String>,

    /// Media file path, relative to the storage root.
    pub media_local_path: Option<String>,
    /// Media file extension (without the dot).
    pub media_ext: Option<String>,
    /// Thumbnail file path, relative to the storage root.
    pub thumbnail_local_path: Option<String>,

    /// Current lifecycle state.
    pub status: JobStatus,
    /// When the job entered `queued`.
    pub queued_at: Option<DateTime<Utc>>,
    /// When a worker began the most recent attempt.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job most recently became `paused`.
    pub paused_at: Option<DateTime<Utc>>,
    /// When the job reached `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job reached `failed`.
    pub failed_at: Option<DateTime<Utc>>,
    /// Last write timestamp; monotonically non-decreasing per job.
    pub updated_at: DateTime<Utc>,

    /// Completion percent, two-decimal, `[0, 100]`.
    pub progress_percent: Option<f64>,
    /// Bytes downloaded so far in the current/most recent attempt.
    pub downloaded_bytes: i64,
    /// Total expected bytes, if the extractor reports one.
    pub total_bytes: Option<i64>,
    /// Current transfer speed in bytes/second.
    pub speed_bps: Option<f64>,
    /// Estimated seconds remaining.
    pub eta_seconds: Option<i64>,

    /// 1-based index of the attempt currently running or most recently run.
    pub attempt_current: i32,
    /// Cap on attempts for this job's lifetime.
    pub attempt_max: i32,
    /// Which option bundle the current/most recent attempt used.
    pub runtime_profile: RuntimeProfile,
    /// Exception type name from the most recent failure, if any.
    pub last_exception_type: Option<String>,
    /// Human-readable error message from the most recent failure, if any.
    pub error_message: Option<String>,

    /// The extractor's full info dict, serialised as a JSON string for
    /// forensic inspection. Always valid JSON; never fails to populate.
    pub metadata_json: Option<String>,
}

impl Job {
    /// `true` once the job has reached a terminal, restart-safe state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One execution of the extractor for a job under a given runtime profile
/// (§3.2). Append-only; deleted transitively with the owning job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Auto-increment primary key.
    pub id: i64,
    /// The owning job's id.
    pub download_id: String,
    /// 1-based attempt number within this job's lifetime.
    pub attempt_no: i32,
    /// Which option bundle this attempt used.
    pub runtime_profile: RuntimeProfile,
    /// Current status of this attempt.
    pub status: AttemptStatus,
    /// Error message, set when `status = failed`.
    pub error_message: Option<String>,
    /// Exception type name, set when `status = failed`.
    pub exception_type: Option<String>,
    /// When the attempt began.
    pub started_at: DateTime<Utc>,
    /// When the attempt ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
}

/// Sort order for `list` queries (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first.
    CreatedDesc,
    /// Oldest first.
    CreatedAsc,
    /// Case-insensitive title ascending, nulls as empty, tiebroken by
    /// `created_at DESC`.
    TitleAsc,
    /// Case-insensitive uploader ascending, nulls as empty, tiebroken by
    /// `created_at DESC`.
    UploaderAsc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::CreatedDesc
    }
}

impl SortOrder {
    /// Parse a sort id, defaulting to [`SortOrder::CreatedDesc`] for
    /// anything unrecognised.
    #[must_use]
    pub fn parse(id: Option<&str>) -> Self {
        match id {
            Some("created_asc") => Self::CreatedAsc,
            Some("title_asc") => Self::TitleAsc,
            Some("uploader_asc") => Self::UploaderAsc,
            _ => Self::CreatedDesc,
        }
    }
}

/// Query parameters accepted by `list` (§4.1, §6.2).
#[derive(Debug, Clone)]
pub struct JobListQuery {
    /// 1-based page number, clamped to `1..=100000` by the caller.
    pub page: u32,
    /// Page size, clamped to `1..=100` by the caller.
    pub per_page: u32,
    /// Optional status filter.
    pub status: Option<JobStatus>,
    /// Optional case-folded substring match against title/uploader/video_id.
    pub q: Option<String>,
    /// Sort order.
    pub sort: SortOrder,
    /// Optional exact uploader filter.
    pub uploader: Option<String>,
}

/// A page of jobs plus the total matching row count.
#[derive(Debug, Clone)]
pub struct JobPage {
    /// The jobs on this page.
    pub jobs: Vec<Job>,
    /// Total rows matching the filter, across all pages.
    pub total: i64,
}

/// Per-status counts, as returned by `count_by_status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_round_trips_through_id() {
        for preset in all_presets() {
            assert_eq!(Preset::parse(preset.id()).unwrap().id(), preset.id());
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = Preset::parse("not_a_preset").unwrap_err();
        assert!(matches!(err, DomainError::UnknownPreset { .. }));
    }

    #[test]
    fn preset_json_matches_its_canonical_id() {
        for preset in all_presets() {
            let json = serde_json::to_string(&preset).unwrap();
            assert_eq!(json, format!("\"{}\"", preset.id()));
        }
    }

    #[test]
    fn job_status_in_flight_and_terminal_are_disjoint() {
        for status in [
            JobStatus::Queued,
            JobStatus::Downloading,
            JobStatus::Retrying,
            JobStatus::Paused,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(!(status.is_in_flight() && status.is_terminal()));
        }
        assert!(JobStatus::Downloading.is_in_flight());
        assert!(JobStatus::Completed.is_terminal());
    }

    #[test]
    fn sort_order_defaults_unknown_to_created_desc() {
        assert_eq!(SortOrder::parse(Some("bogus")), SortOrder::CreatedDesc);
        assert_eq!(SortOrder::parse(None), SortOrder::CreatedDesc);
        assert_eq!(SortOrder::parse(Some("title_asc")), SortOrder::TitleAsc);
    }
}
