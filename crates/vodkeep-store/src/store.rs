//! The durable job/attempt store. Every write here is one conditional,
//! atomic `UPDATE ... WHERE` statement; see spec §4.1 and the design note
//! in `DESIGN.md` on why read-modify-write is disallowed.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use vodkeep_domain::{
    Attempt, AttemptStatus, Job, JobListQuery, JobPage, JobStatus, Preset, RuntimeProfile,
    SortOrder, StatusCounts,
};

use crate::error::StoreError;
use crate::row::{attempt_from_row, job_from_row, job_status_str, parse_job_status};

/// Parameters accepted by [`JobStore::finish_ok`], grouped to keep the
/// call site readable — this is the one write that touches every derived
/// identity and artifact-path column at once.
#[derive(Debug, Clone, Default)]
pub struct FinishOk {
    /// Extractor-normalised URL.
    pub canonical_url: Option<String>,
    /// Resolved webpage URL.
    pub webpage_url: Option<String>,
    /// Extractor-assigned video id.
    pub video_id: Option<String>,
    /// Extractor name.
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
    pub duration_seconds: Option<f64>,
    /// Upload date string, as reported.
    pub upload_date: Option<String>,
    /// Remote thumbnail URL.
    pub thumbnail_remote_url: Option<String>,
    /// Media path, relative to the storage root.
    pub media_local_path: Option<String>,
    /// Media file extension.
    pub media_ext: Option<String>,
    /// Thumbnail path, relative to the storage root.
    pub thumbnail_local_path: Option<String>,
    /// The extractor's info dict, already serialised to JSON (lossy-but-
    /// total: callers must never fail this step).
    pub metadata_json: Option<String>,
}

/// Durable mapping of job id -> job record, plus the append-only attempts
/// log. The sole owner of row mutation (§3.3).
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Wrap an already-connected pool. Use [`crate::connect`] to open one
    /// with the durability settings this store expects.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool, e.g. for a readiness probe that needs a
    /// raw connection.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a new job row in `queued` state with a fresh, collision-
    /// resistant, URL-safe id. Returns the created row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn enqueue(&self, requested_url: &str, preset: Preset) -> Result<Job, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO downloads (
                id, requested_url, preset, created_at,
                status, queued_at, updated_at,
                downloaded_bytes, attempt_current, attempt_max, runtime_profile
            ) VALUES (?, ?, ?, ?, 'queued', ?, ?, 0, 0, 1, 'primary')
            ",
        )
        .bind(&id)
        .bind(requested_url)
        .bind(preset.id())
        .bind(&now_str)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        self.get(&id).await?.ok_or(StoreError::NotFound { id })
    }

    /// Transition `queued|retrying|downloading -> downloading|retrying`
    /// per the attempt plan. `attempt_no == 1` lands on `downloading`;
    /// later attempts land on `retrying`. Returns whether the transition
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn begin(
        &self,
        id: &str,
        attempt_no: i32,
        attempt_max: i32,
        profile: RuntimeProfile,
    ) -> Result<bool, StoreError> {
        let target = if attempt_no <= 1 {
            JobStatus::Downloading
        } else {
            JobStatus::Retrying
        };
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = ?, started_at = COALESCE(started_at, ?), updated_at = ?,
                attempt_current = ?, attempt_max = ?, runtime_profile = ?,
                error_message = NULL, last_exception_type = NULL
            WHERE id = ? AND status IN ('queued', 'downloading', 'retrying')
            ",
        )
        .bind(job_status_str(target))
        .bind(&now)
        .bind(&now)
        .bind(attempt_no)
        .bind(attempt_max)
        .bind(profile.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition `downloading|retrying -> completed`. Writes every
    /// derived identity/artifact field supplied in `data`, and clears
    /// `speed_bps`, `eta_seconds`, `error_message`, and
    /// `last_exception_type` so a job that completes after a prior
    /// failed attempt doesn't keep a stale error on its terminal row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn finish_ok(&self, id: &str, data: &FinishOk) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = 'completed', completed_at = ?, updated_at = ?,
                progress_percent = 100.0,
                speed_bps = NULL, eta_seconds = NULL,
                error_message = NULL, last_exception_type = NULL,
                canonical_url = ?, webpage_url = ?, video_id = ?,
                extractor = ?, extractor_key = ?, title = ?,
                uploader = ?, uploader_id = ?, channel = ?, channel_id = ?,
                duration_seconds = ?, upload_date = ?, thumbnail_remote_url = ?,
                media_local_path = ?, media_ext = ?, thumbnail_local_path = ?,
                metadata_json = ?
            WHERE id = ? AND status IN ('downloading', 'retrying')
            ",
        )
        .bind(&now)
        .bind(&now)
        .bind(&data.canonical_url)
        .bind(&data.webpage_url)
        .bind(&data.video_id)
        .bind(&data.extractor)
        .bind(&data.extractor_key)
        .bind(&data.title)
        .bind(&data.uploader)
        .bind(&data.uploader_id)
        .bind(&data.channel)
        .bind(&data.channel_id)
        .bind(data.duration_seconds)
        .bind(&data.upload_date)
        .bind(&data.thumbnail_remote_url)
        .bind(&data.media_local_path)
        .bind(&data.media_ext)
        .bind(&data.thumbnail_local_path)
        .bind(&data.metadata_json)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition to `failed`, unconditionally on id (applies regardless
    /// of current status — a worker that exhausts its attempt plan always
    /// wins the race to mark the job failed).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn finish_fail(
        &self,
        id: &str,
        error_message: &str,
        exception_type: &str,
        profile: RuntimeProfile,
        attempt_no: i32,
    ) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = 'failed', failed_at = ?, updated_at = ?,
                error_message = ?, last_exception_type = ?,
                runtime_profile = ?, attempt_current = ?
            WHERE id = ?
            ",
        )
        .bind(&now)
        .bind(&now)
        .bind(error_message)
        .bind(exception_type)
        .bind(profile.as_str())
        .bind(attempt_no)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition `queued -> paused`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn pause_queued(&self, id: &str) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE downloads SET status = 'paused', paused_at = ?, updated_at = ? \
             WHERE id = ? AND status = 'queued'",
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `* -> paused`, unconditionally on id. Used to force an
    /// in-flight (`downloading`/`retrying`) job to stop after the worker
    /// observes the cancel signal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn pause_force(&self, id: &str) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE downloads SET status = 'paused', paused_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `paused -> queued`, clearing `paused_at`, the error
    /// fields, speed, and ETA.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn resume(&self, id: &str) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = 'queued', paused_at = NULL, updated_at = ?,
                error_message = NULL, last_exception_type = NULL,
                speed_bps = NULL, eta_seconds = NULL
            WHERE id = ? AND status = 'paused'
            ",
        )
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `failed|paused -> queued`, zeroing progress telemetry
    /// and incrementing `attempt_max` by exactly 1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn retry(&self, id: &str) -> Result<bool, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = 'queued', updated_at = ?,
                queued_at = ?, paused_at = NULL, failed_at = NULL,
                error_message = NULL, last_exception_type = NULL,
                progress_percent = NULL, downloaded_bytes = 0,
                total_bytes = NULL, speed_bps = NULL, eta_seconds = NULL,
                attempt_max = attempt_max + 1
            WHERE id = ? AND status IN ('failed', 'paused')
            ",
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a job row and its attempts (cascaded by the foreign key).
    /// Returns the row as it existed immediately before deletion, so the
    /// caller can clean up on-disk artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn delete(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT * FROM downloads WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = existing else {
            tx.rollback().await?;
            return Ok(None);
        };
        let job = job_from_row(&row)?;

        sqlx::query("DELETE FROM downloads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(job))
    }

    /// Unconditional point-write of the progress telemetry columns.
    /// Callers are responsible for rate-limiting (spec §4.3.1); this call
    /// itself is cheap and unconditional.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn update_progress(
        &self,
        id: &str,
        percent: Option<f64>,
        downloaded_bytes: i64,
        total_bytes: Option<i64>,
        speed_bps: Option<f64>,
        eta_seconds: Option<i64>,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r"
            UPDATE downloads
            SET progress_percent = ?, downloaded_bytes = ?, total_bytes = ?,
                speed_bps = ?, eta_seconds = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(percent)
        .bind(downloaded_bytes)
        .bind(total_bytes)
        .bind(speed_bps)
        .bind(eta_seconds)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a new `started` attempt row and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn insert_attempt(
        &self,
        download_id: &str,
        attempt_no: i32,
        profile: RuntimeProfile,
    ) -> Result<i64, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            INSERT INTO download_attempts (download_id, attempt_no, runtime_profile, status, started_at)
            VALUES (?, ?, ?, 'started', ?)
            ",
        )
        .bind(download_id)
        .bind(attempt_no)
        .bind(profile.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Finalise an attempt row with a terminal status and optional error
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn finalize_attempt(
        &self,
        attempt_id: i64,
        status: AttemptStatus,
        error_message: Option<&str>,
        exception_type: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r"
            UPDATE download_attempts
            SET status = ?, error_message = ?, exception_type = ?, ended_at = ?
            WHERE id = ?
            ",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(exception_type)
        .bind(&now)
        .bind(attempt_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Fetch every attempt row for a job, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn list_attempts(&self, download_id: &str) -> Result<Vec<Attempt>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM download_attempts WHERE download_id = ? ORDER BY attempt_no ASC",
        )
        .bind(download_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(attempt_from_row).collect()
    }

    /// Point read by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn get(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query("SELECT * FROM downloads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(job_from_row).transpose()
    }

    /// Look up a job by the basename of its media or thumbnail path
    /// (legacy `POST /delete` by filename).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn get_by_filename(&self, filename: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT * FROM downloads
            WHERE media_local_path LIKE '%' || ? ESCAPE '\'
               OR thumbnail_local_path LIKE '%' || ? ESCAPE '\'
            LIMIT 1
            ",
        )
        .bind(filename)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(job_from_row).transpose()
    }

    /// Up to `limit` queued job ids, FIFO by `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn queued_ids(&self, limit: u32) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT id FROM downloads WHERE status = 'queued' ORDER BY created_at ASC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| row.try_get("id")).collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Count of jobs currently `queued`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn count_queued(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM downloads WHERE status = 'queued'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    /// Per-status counts across the whole table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM downloads GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            match parse_job_status(&status) {
                JobStatus::Queued => counts.queued = n,
                JobStatus::Downloading => counts.downloading = n,
                JobStatus::Retrying => counts.retrying = n,
                JobStatus::Paused => counts.paused = n,
                JobStatus::Completed => counts.completed = n,
                JobStatus::Failed => counts.failed = n,
            }
        }
        Ok(counts)
    }

    /// Paginated, filterable, sortable job listing (§4.1, §6.2).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn list(&self, query: &JobListQuery) -> Result<JobPage, StoreError> {
        let mut where_clauses: Vec<String> = Vec::new();
        let status_str = query.status.map(job_status_str);
        if status_str.is_some() {
            where_clauses.push("status = ?".to_string());
        }
        let q_pattern = query.q.as_ref().map(|q| format!("%{}%", q.to_lowercase()));
        if q_pattern.is_some() {
            where_clauses.push(
                "(LOWER(COALESCE(title, '')) LIKE ? OR LOWER(COALESCE(uploader, '')) LIKE ? \
                 OR LOWER(COALESCE(video_id, '')) LIKE ?)"
                    .to_string(),
            );
        }
        if query.uploader.is_some() {
            where_clauses.push("uploader = ?".to_string());
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let order_sql = match query.sort {
            SortOrder::CreatedDesc => "ORDER BY created_at DESC",
            SortOrder::CreatedAsc => "ORDER BY created_at ASC",
            SortOrder::TitleAsc => {
                "ORDER BY LOWER(COALESCE(title, '')) ASC, created_at DESC"
            }
            SortOrder::UploaderAsc => {
                "ORDER BY LOWER(COALESCE(uploader, '')) ASC, created_at DESC"
            }
        };

        let offset = i64::from(query.page.saturating_sub(1)) * i64::from(query.per_page);

        let count_sql = format!("SELECT COUNT(*) AS n FROM downloads {where_sql}");
        let mut count_query = sqlx::query(&count_sql);
        if let Some(status) = status_str {
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &q_pattern {
            count_query = count_query.bind(pattern).bind(pattern).bind(pattern);
        }
        if let Some(uploader) = &query.uploader {
            count_query = count_query.bind(uploader);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.try_get("n")?;

        let list_sql =
            format!("SELECT * FROM downloads {where_sql} {order_sql} LIMIT ? OFFSET ?");
        let mut list_query = sqlx::query(&list_sql);
        if let Some(status) = status_str {
            list_query = list_query.bind(status);
        }
        if let Some(pattern) = &q_pattern {
            list_query = list_query.bind(pattern).bind(pattern).bind(pattern);
        }
        if let Some(uploader) = &query.uploader {
            list_query = list_query.bind(uploader);
        }
        let rows = list_query
            .bind(i64::from(query.per_page))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let jobs = rows.iter().map(job_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage { jobs, total })
    }

    /// Mark every row stuck in `downloading` as `failed` with
    /// `error_message = "interrupted_by_restart"` (spec §4.5). Run exactly
    /// once, before the scheduler starts. `queued`, `paused`, and
    /// `retrying` rows are left untouched — `retrying` is intentionally
    /// equivalent to `queued` on re-entry by `begin`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on a connection/query failure.
    pub async fn recover_interrupted(&self) -> Result<u64, StoreError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            UPDATE downloads
            SET status = 'failed', error_message = 'interrupted_by_restart',
                failed_at = ?, updated_at = ?
            WHERE status = 'downloading'
            ",
        )
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert then delete a throwaway row within the same connection, to
    /// confirm the database is both readable and writable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if either step fails.
    pub async fn check_read_write(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("INSERT INTO health_probe (id, value) VALUES (1, 'ok') \
                     ON CONFLICT(id) DO UPDATE SET value = 'ok'")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM health_probe WHERE id = 1")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
