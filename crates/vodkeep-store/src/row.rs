//! Mapping between SQLite rows and domain types.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use vodkeep_domain::{Attempt, AttemptStatus, Job, JobStatus, Preset, RuntimeProfile};

use crate::error::StoreError;

pub(crate) fn job_status_str(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "queued",
        JobStatus::Downloading => "downloading",
        JobStatus::Retrying => "retrying",
        JobStatus::Paused => "paused",
        JobStatus::Completed => "completed",
        JobStatus::Failed => "failed",
    }
}

pub(crate) fn parse_job_status(raw: &str) -> JobStatus {
    match raw {
        "downloading" => JobStatus::Downloading,
        "retrying" => JobStatus::Retrying,
        "paused" => JobStatus::Paused,
        "completed" => JobStatus::Completed,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Queued,
    }
}

pub(crate) fn parse_runtime_profile(raw: &str) -> RuntimeProfile {
    match raw {
        "fallback" => RuntimeProfile::Fallback,
        _ => RuntimeProfile::Primary,
    }
}

pub(crate) fn parse_attempt_status(raw: &str) -> AttemptStatus {
    match raw {
        "completed" => AttemptStatus::Completed,
        "failed" => AttemptStatus::Failed,
        "paused" => AttemptStatus::Paused,
        _ => AttemptStatus::Started,
    }
}

fn parse_ts(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn job_from_row(row: &SqliteRow) -> Result<Job, StoreError> {
    let status_raw: String = row.try_get("status")?;
    let preset_raw: String = row.try_get("preset")?;
    let profile_raw: String = row.try_get("runtime_profile")?;
    let created_at_raw: String = row.try_get("created_at")?;
    let updated_at_raw: String = row.try_get("updated_at")?;

    Ok(Job {
        id: row.try_get("id")?,
        requested_url: row.try_get("requested_url")?,
        preset: Preset::parse(&preset_raw).unwrap_or(Preset::Best),
        created_at: parse_ts(Some(created_at_raw)).unwrap_or_else(Utc::now),

        canonical_url: row.try_get("canonical_url")?,
        webpage_url: row.try_get("webpage_url")?,
        video_id: row.try_get("video_id")?,
        extractor: row.try_get("extractor")?,
        extractor_key: row.try_get("extractor_key")?,
        title: row.try_get("title")?,
        uploader: row.try_get("uploader")?,
        uploader_id: row.try_get("uploader_id")?,
        channel: row.try_get("channel")?,
        channel_id: row.try_get("channel_id")?,
        duration_seconds: row.try_get("duration_seconds")?,
        upload_date: row.try_get("upload_date")?,
        thumbnail_remote_url: row.try_get("thumbnail_remote_url")?,

        media_local_path: row.try_get("media_local_path")?,
        media_ext: row.try_get("media_ext")?,
        thumbnail_local_path: row.try_get("thumbnail_local_path")?,

        status: parse_job_status(&status_raw),
        queued_at: parse_ts(row.try_get("queued_at")?),
        started_at: parse_ts(row.try_get("started_at")?),
        paused_at: parse_ts(row.try_get("paused_at")?),
        completed_at: parse_ts(row.try_get("completed_at")?),
        failed_at: parse_ts(row.try_get("failed_at")?),
        updated_at: parse_ts(Some(updated_at_raw)).unwrap_or_else(Utc::now),

        progress_percent: row.try_get("progress_percent")?,
        downloaded_bytes: row.try_get("downloaded_bytes")?,
        total_bytes: row.try_get("total_bytes")?,
        speed_bps: row.try_get("speed_bps")?,
        eta_seconds: row.try_get("eta_seconds")?,

        attempt_current: row.try_get("attempt_current")?,
        attempt_max: row.try_get("attempt_max")?,
        runtime_profile: parse_runtime_profile(&profile_raw),
        last_exception_type: row.try_get("last_exception_type")?,
        error_message: row.try_get("error_message")?,

        metadata_json: row.try_get("metadata_json")?,
    })
}

pub(crate) fn attempt_from_row(row: &SqliteRow) -> Result<Attempt, StoreError> {
    let profile_raw: String = row.try_get("runtime_profile")?;
    let status_raw: String = row.try_get("status")?;
    let started_at_raw: String = row.try_get("started_at")?;

    Ok(Attempt {
        id: row.try_get("id")?,
        download_id: row.try_get("download_id")?,
        attempt_no: row.try_get("attempt_no")?,
        runtime_profile: parse_runtime_profile(&profile_raw),
        status: parse_attempt_status(&status_raw),
        error_message: row.try_get("error_message")?,
        exception_type: row.try_get("exception_type")?,
        started_at: parse_ts(Some(started_at_raw)).unwrap_or_else(Utc::now),
        ended_at: parse_ts(row.try_get("ended_at")?),
    })
}
