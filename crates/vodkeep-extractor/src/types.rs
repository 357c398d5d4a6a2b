//! Types exchanged across the extractor adapter boundary (spec §4.6).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vodkeep_domain::RuntimeProfile;

/// Options the adapter builds for a single attempt, derived from the
/// job's preset and runtime profile.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Output filename template.
    pub outtmpl: String,
    /// Sanitise filenames for the local filesystem.
    pub restrictfilenames: bool,
    /// Format selector string, per preset.
    pub format: String,
    /// Muxed container for video presets (`mp4`).
    pub merge_output_format: Option<String>,
    /// Audio extraction target format for the audio-only preset.
    pub audio_format: Option<String>,
    /// Always on: persist the remote thumbnail alongside the media file.
    pub writethumbnail: bool,
    /// Always on: persist the info dict as a sidecar JSON file.
    pub writeinfojson: bool,
    /// Internal extractor retry count (floor 3).
    pub retries: u32,
    /// Fixed at 5 per spec.
    pub concurrent_fragment_downloads: u32,
    /// JS runtime interpreter and path, resolved from configuration.
    pub js_runtime: String,
    /// Path to the JS runtime interpreter binary.
    pub js_runtime_path: PathBuf,
    /// Optional explicit `ffmpeg` binary location.
    pub ffmpeg_location: Option<PathBuf>,
    /// Alternate player clients used on the YouTube fallback profile.
    pub extractor_args_youtube_player_client: Option<Vec<&'static str>>,
}

impl ExtractOptions {
    /// Player clients tried on the fallback profile (spec §4.6).
    pub const FALLBACK_PLAYER_CLIENTS: [&'static str; 4] =
        ["android_vr", "android", "ios", "tv"];

    /// The minimum internal extractor retry count spec §4.6 requires.
    pub const MIN_RETRIES: u32 = 3;

    /// Fixed fragment concurrency spec §4.6 requires.
    pub const CONCURRENT_FRAGMENT_DOWNLOADS: u32 = 5;

    /// Whether this attempt is running on the YouTube fallback profile.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.extractor_args_youtube_player_client.is_some()
    }
}

/// One progress callback payload from the extractor (spec §4.3.1).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressEvent {
    /// `downloading`, `finished`, or any other status (ignored).
    pub status: String,
    /// Bytes transferred so far.
    #[serde(default)]
    pub downloaded_bytes: Option<i64>,
    /// Total bytes, if known up front.
    #[serde(default)]
    pub total_bytes: Option<i64>,
    /// Total bytes, estimated (used when `total_bytes` is absent).
    #[serde(default)]
    pub total_bytes_estimate: Option<i64>,
    /// Current transfer speed in bytes/second.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Estimated seconds remaining.
    #[serde(default)]
    pub eta: Option<i64>,
}

impl ProgressEvent {
    /// `total_bytes`, falling back to `total_bytes_estimate`.
    #[must_use]
    pub const fn total_or_estimate(&self) -> Option<i64> {
        match self.total_bytes {
            Some(total) => Some(total),
            None => self.total_bytes_estimate,
        }
    }
}

/// A candidate download entry from the extractor's `requested_downloads`
/// list (spec §4.3.2).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestedDownload {
    /// Absolute or storage-root-relative path to the downloaded file.
    pub filepath: Option<String>,
    /// Legacy filename field some extractor versions emit instead.
    #[serde(rename = "_filename")]
    pub filename_legacy: Option<String>,
}

impl RequestedDownload {
    /// The best available path candidate on this entry.
    #[must_use]
    pub fn candidate(&self) -> Option<&str> {
        self.filepath.as_deref().or(self.filename_legacy.as_deref())
    }
}

/// The extractor's info dict for a single resolved video (spec §3.1,
/// §4.3.2). Playlists are reduced to their first entry before this type
/// is populated.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InfoDict {
    /// Extractor-assigned video id.
    pub id: Option<String>,
    /// Extractor-normalised canonical URL.
    pub canonical_url: Option<String>,
    /// Page URL the extractor resolved.
    pub webpage_url: Option<String>,
    /// Extractor name (e.g. `youtube`).
    pub extractor: Option<String>,
    /// Extractor-specific key.
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
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Upload date, as reported (`YYYYMMDD` or similar).
    pub upload_date: Option<String>,
    /// Remote thumbnail URL.
    pub thumbnail: Option<String>,
    /// Candidate output paths the extractor actually wrote.
    #[serde(default)]
    pub requested_downloads: Vec<RequestedDownload>,
    /// Info-dict-level path candidate.
    pub filepath: Option<String>,
    /// Legacy info-dict path candidate.
    #[serde(rename = "_filename")]
    pub filename_legacy: Option<String>,
    /// Another legacy path candidate some extractor versions emit.
    pub filename: Option<String>,
    /// Playlist entries; when present the first is used as the effective
    /// info dict and this field itself is dropped from persisted metadata.
    #[serde(default)]
    pub entries: Vec<Value>,
    /// Everything else the extractor reported, preserved for the
    /// forensic `metadata_json` column.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl InfoDict {
    /// Every local path candidate named in §4.3.2 step 2, info-dict level.
    #[must_use]
    pub fn local_path_candidates(&self) -> Vec<String> {
        [&self.filepath, &self.filename_legacy, &self.filename]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// `requested_downloads` path candidates, in order (§4.3.2 step 1).
    #[must_use]
    pub fn requested_download_candidates(&self) -> Vec<String> {
        self.requested_downloads
            .iter()
            .filter_map(RequestedDownload::candidate)
            .map(str::to_string)
            .collect()
    }
}

/// Lightweight metadata returned by the probe operation (§11): title and
/// extension resolved without downloading.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeInfo {
    /// Resolved video title, if the extractor reported one.
    pub title: Option<String>,
    /// Likely file extension for the default preset's format selector.
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

/// Runtime diagnostics the extractor adapter resolved at startup (§11).
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeDiagnostics {
    /// The JS runtime interpreter name (`node`, etc).
    pub js_runtime: String,
    /// Resolved path to the JS runtime interpreter.
    pub js_runtime_path: PathBuf,
    /// Resolved `ffmpeg` path, if configured.
    pub ffmpeg_path: Option<PathBuf>,
    /// Whether the YouTube fallback profile is enabled.
    pub youtube_fallback_enabled: bool,
    /// Worker pool concurrency ceiling.
    pub max_concurrent_downloads: usize,
}

/// Which runtime profile an [`ExtractOptions`] bundle was built for.
#[derive(Debug, Clone, Copy)]
pub struct ProfileSelector {
    /// The preset driving the format selector and postprocessing chain.
    pub preset: vodkeep_domain::Preset,
    /// Whether this attempt should use the YouTube fallback player
    /// clients.
    pub profile: RuntimeProfile,
}
