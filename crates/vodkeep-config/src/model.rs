//! The static, process-lifetime settings surface (spec §6.4).

use std::path::PathBuf;
use std::time::Duration;

/// Floor applied to [`Settings::job_progress_flush_interval`]; values below
/// this are clamped up, with a warning logged by the loader.
pub const MIN_PROGRESS_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Settings resolved once at process startup and held for the life of the
/// process. There is no dynamic reload: a changed environment requires a
/// restart.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory under which every job's artifacts are confined.
    pub base_download_dir: PathBuf,
    /// Path to the SQLite database file backing the job store.
    pub sqlite_path: PathBuf,
    /// Maximum number of attempts the scheduler will run concurrently.
    pub max_concurrent_downloads: usize,
    /// Minimum free disk space, in megabytes, required to admit a job.
    pub min_free_disk_mb: u64,
    /// How often a worker flushes progress to the store while running.
    pub job_progress_flush_interval: Duration,
    /// Log level passed to the tracing `EnvFilter`.
    pub log_level: String,
    /// Interpreter used to run the extractor engine's JS runtime shim.
    pub ytdlp_js_runtime: String,
    /// Path to the JS runtime interpreter binary.
    pub ytdlp_js_runtime_path: PathBuf,
    /// Optional explicit path to an `ffmpeg` binary for the extractor engine.
    pub ytdlp_ffmpeg_path: Option<PathBuf>,
    /// Whether the extractor engine may fall back to an alternate YouTube
    /// client when the primary one is blocked.
    pub ytdlp_enable_youtube_fallback: bool,
    /// Address the HTTP control plane binds to.
    pub http_bind_addr: String,
    /// Port the HTTP control plane binds to.
    pub http_port: u16,
}

impl Settings {
    /// Socket address string suitable for a TCP listener bind.
    #[must_use]
    pub fn http_socket_addr(&self) -> String {
        format!("{}:{}", self.http_bind_addr, self.http_port)
    }
}
