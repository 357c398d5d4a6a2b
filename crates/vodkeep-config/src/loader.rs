//! Loads [`Settings`] from the process environment (spec §6.4).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::{Settings, MIN_PROGRESS_FLUSH_INTERVAL};

const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;
const DEFAULT_MIN_FREE_DISK_MB: u64 = 512;
const DEFAULT_JOB_PROGRESS_FLUSH_INTERVAL_MS: u64 = 750;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_YTDLP_JS_RUNTIME: &str = "node";
const DEFAULT_YTDLP_JS_RUNTIME_PATH: &str = "/usr/bin/node";
const DEFAULT_HTTP_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8000;

/// Read every setting named in spec §6.4 from the environment, applying
/// defaults and validating values that must parse as numbers or booleans.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVar`] if a required variable (one with no
/// sensible default, such as `BASE_DOWNLOAD_DIR`) is absent, or
/// [`ConfigError::InvalidValue`] if a present variable fails to parse.
pub fn from_env() -> Result<Settings, ConfigError> {
    let base_download_dir = required_path("BASE_DOWNLOAD_DIR")?;
    let sqlite_path = required_path("SQLITE_PATH")?;

    let max_concurrent_downloads = parse_or_default(
        "MAX_CONCURRENT_DOWNLOADS",
        DEFAULT_MAX_CONCURRENT_DOWNLOADS,
    )?;
    let min_free_disk_mb = parse_or_default("MIN_FREE_DISK_MB", DEFAULT_MIN_FREE_DISK_MB)?;

    let flush_ms = parse_or_default(
        "JOB_PROGRESS_FLUSH_INTERVAL_MS",
        DEFAULT_JOB_PROGRESS_FLUSH_INTERVAL_MS,
    )?;
    let mut job_progress_flush_interval = Duration::from_millis(flush_ms);
    if job_progress_flush_interval < MIN_PROGRESS_FLUSH_INTERVAL {
        tracing::warn!(
            requested_ms = flush_ms,
            floor_ms = MIN_PROGRESS_FLUSH_INTERVAL.as_millis() as u64,
            "JOB_PROGRESS_FLUSH_INTERVAL_MS below floor, clamping"
        );
        job_progress_flush_interval = MIN_PROGRESS_FLUSH_INTERVAL;
    }

    let log_level = string_or_default("LOG_LEVEL", DEFAULT_LOG_LEVEL);
    let ytdlp_js_runtime = string_or_default("YTDLP_JS_RUNTIME", DEFAULT_YTDLP_JS_RUNTIME);
    let ytdlp_js_runtime_path = optional_path("YTDLP_JS_RUNTIME_PATH")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_JS_RUNTIME_PATH));
    let ytdlp_ffmpeg_path = optional_path("YTDLP_FFMPEG_PATH");
    let ytdlp_enable_youtube_fallback = parse_bool_or_default(
        "YTDLP_ENABLE_YOUTUBE_FALLBACK",
        true,
    )?;

    let http_bind_addr = string_or_default("HTTP_BIND_ADDR", DEFAULT_HTTP_BIND_ADDR);
    let http_port = parse_or_default("HTTP_PORT", DEFAULT_HTTP_PORT)?;

    Ok(Settings {
        base_download_dir,
        sqlite_path,
        max_concurrent_downloads,
        min_free_disk_mb,
        job_progress_flush_interval,
        log_level,
        ytdlp_js_runtime,
        ytdlp_js_runtime_path,
        ytdlp_ffmpeg_path,
        ytdlp_enable_youtube_fallback,
        http_bind_addr,
        http_port,
    })
}

fn required_path(name: &'static str) -> Result<PathBuf, ConfigError> {
    std::env::var(name)
        .map(PathBuf::from)
        .map_err(|_| ConfigError::MissingVar { name })
}

fn optional_path(name: &'static str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

fn string_or_default(name: &'static str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or_default<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
            name,
            value,
            reason: err.to_string(),
        }),
    }
}

fn parse_bool_or_default(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name,
                value,
                reason: "expected one of: 1/0, true/false, yes/no, on/off".to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for name in [
            "BASE_DOWNLOAD_DIR",
            "SQLITE_PATH",
            "MAX_CONCURRENT_DOWNLOADS",
            "MIN_FREE_DISK_MB",
            "JOB_PROGRESS_FLUSH_INTERVAL_MS",
            "LOG_LEVEL",
            "YTDLP_JS_RUNTIME",
            "YTDLP_JS_RUNTIME_PATH",
            "YTDLP_FFMPEG_PATH",
            "YTDLP_ENABLE_YOUTUBE_FALLBACK",
            "HTTP_BIND_ADDR",
            "HTTP_PORT",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn missing_required_var_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar { name: "BASE_DOWNLOAD_DIR" }));
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("BASE_DOWNLOAD_DIR", "/data/downloads");
        std::env::set_var("SQLITE_PATH", "/data/jobs.sqlite3");

        let settings = from_env().unwrap();
        assert_eq!(settings.max_concurrent_downloads, DEFAULT_MAX_CONCURRENT_DOWNLOADS);
        assert_eq!(settings.http_port, DEFAULT_HTTP_PORT);
        assert!(settings.ytdlp_enable_youtube_fallback);
        assert_eq!(settings.ytdlp_ffmpeg_path, None);
        clear_all();
    }

    #[test]
    fn sub_floor_flush_interval_is_clamped() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("BASE_DOWNLOAD_DIR", "/data/downloads");
        std::env::set_var("SQLITE_PATH", "/data/jobs.sqlite3");
        std::env::set_var("JOB_PROGRESS_FLUSH_INTERVAL_MS", "10");

        let settings = from_env().unwrap();
        assert_eq!(settings.job_progress_flush_interval, MIN_PROGRESS_FLUSH_INTERVAL);
        clear_all();
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("BASE_DOWNLOAD_DIR", "/data/downloads");
        std::env::set_var("SQLITE_PATH", "/data/jobs.sqlite3");
        std::env::set_var("YTDLP_ENABLE_YOUTUBE_FALLBACK", "maybe");

        let err = from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: "YTDLP_ENABLE_YOUTUBE_FALLBACK", .. }
        ));
        clear_all();
    }
}
