//! Schema bootstrap and connection pool construction.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// DDL applied on every startup. Idempotent: `CREATE TABLE/INDEX IF NOT
/// EXISTS` so repeated application is a no-op once the schema exists.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS downloads (
    id                     TEXT PRIMARY KEY,
    requested_url          TEXT NOT NULL,
    preset                 TEXT NOT NULL,
    created_at             TEXT NOT NULL,

    canonical_url          TEXT,
    webpage_url            TEXT,
    video_id               TEXT,
    extractor              TEXT,
    extractor_key          TEXT,
    title                  TEXT,
    uploader               TEXT,
    uploader_id            TEXT,
    channel                TEXT,
    channel_id             TEXT,
    duration_seconds       REAL,
    upload_date            TEXT,
    thumbnail_remote_url   TEXT,

    media_local_path       TEXT,
    media_ext              TEXT,
    thumbnail_local_path   TEXT,

    status                 TEXT NOT NULL,
    queued_at              TEXT,
    started_at             TEXT,
    paused_at              TEXT,
    completed_at           TEXT,
    failed_at              TEXT,
    updated_at             TEXT NOT NULL,

    progress_percent       REAL,
    downloaded_bytes       INTEGER NOT NULL DEFAULT 0,
    total_bytes            INTEGER,
    speed_bps              REAL,
    eta_seconds            INTEGER,

    attempt_current        INTEGER NOT NULL DEFAULT 0,
    attempt_max            INTEGER NOT NULL DEFAULT 1,
    runtime_profile        TEXT NOT NULL DEFAULT 'primary',
    last_exception_type    TEXT,
    error_message          TEXT,

    metadata_json          TEXT
);

CREATE TABLE IF NOT EXISTS download_attempts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    download_id     TEXT NOT NULL REFERENCES downloads(id) ON DELETE CASCADE,
    attempt_no      INTEGER NOT NULL,
    runtime_profile TEXT NOT NULL,
    status          TEXT NOT NULL,
    error_message   TEXT,
    exception_type  TEXT,
    started_at      TEXT NOT NULL,
    ended_at        TEXT
);

CREATE TABLE IF NOT EXISTS health_probe (
    id    INTEGER PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_downloads_status_created
    ON downloads(status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_downloads_completed_at
    ON downloads(completed_at DESC);
CREATE INDEX IF NOT EXISTS idx_downloads_title
    ON downloads(title);
CREATE INDEX IF NOT EXISTS idx_downloads_uploader
    ON downloads(uploader);
CREATE INDEX IF NOT EXISTS idx_downloads_video_id
    ON downloads(video_id);
CREATE INDEX IF NOT EXISTS idx_attempts_download_id
    ON download_attempts(download_id);
";

/// Open (creating if absent) the SQLite database at `path` with the
/// durability settings spec.md §5 requires: WAL journal mode, a 30s busy
/// timeout, `foreign_keys=ON`, and `synchronous=NORMAL`. Applies the schema
/// before returning.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the connection cannot be established
/// or the schema cannot be applied.
pub async fn connect(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await?;

    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;

    Ok(pool)
}
