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
#![allow(clippy::too_many_lines)]

//! Durable job/attempt store backed by SQLite.
//!
//! The store exposes only total, conditional operations (spec §4.1):
//! every mutating call is a single `UPDATE ... WHERE` with the predicate
//! baked into the `WHERE` clause, never a fetch-then-write. This is what
//! lets the scheduler and control plane race against each other safely
//! without a global job lock (see the design note in `DESIGN.md`).

mod error;
mod row;
mod schema;
mod store;

pub use error::StoreError;
pub use schema::connect;
pub use store::{FinishOk, JobStore};

#[cfg(test)]
mod tests {
    use vodkeep_domain::{
        AttemptStatus, JobListQuery, JobStatus, Preset, RuntimeProfile, SortOrder,
    };

    use super::*;

    async fn temp_store() -> (JobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = connect(&dir.path().join("jobs.sqlite3"))
            .await
            .expect("connect");
        (JobStore::new(pool), dir)
    }

    #[tokio::test]
    async fn enqueue_creates_queued_row() {
        let (store, _dir) = temp_store().await;
        let job = store
            .enqueue("https://example.com/watch?v=abc", Preset::Best)
            .await
            .expect("enqueue");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempt_max, 1);
        assert_eq!(job.downloaded_bytes, 0);
    }

    #[tokio::test]
    async fn pause_queued_then_resume_round_trips() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();

        assert!(store.pause_queued(&job.id).await.unwrap());
        let paused = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(paused.status, JobStatus::Paused);
        assert!(paused.paused_at.is_some());

        assert!(store.resume(&job.id).await.unwrap());
        let resumed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(resumed.status, JobStatus::Queued);
        assert!(resumed.paused_at.is_none());
    }

    #[tokio::test]
    async fn pause_queued_does_not_apply_to_downloading() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        assert!(store.begin(&job.id, 1, 1, RuntimeProfile::Primary).await.unwrap());

        assert!(!store.pause_queued(&job.id).await.unwrap());
        let row = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Downloading);
    }

    #[tokio::test]
    async fn retry_from_failed_increments_attempt_max_and_zeroes_progress() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        assert!(store.begin(&job.id, 1, 1, RuntimeProfile::Primary).await.unwrap());
        store
            .update_progress(&job.id, Some(42.5), 1000, Some(2000), Some(500.0), Some(10))
            .await
            .unwrap();
        assert!(store.finish_fail(&job.id, "boom", "HttpError", RuntimeProfile::Primary, 1).await.unwrap());

        let before = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(before.attempt_max, 1);

        assert!(store.retry(&job.id).await.unwrap());
        let after = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(after.status, JobStatus::Queued);
        assert_eq!(after.attempt_max, 2);
        assert_eq!(after.downloaded_bytes, 0);
        assert!(after.progress_percent.is_none());
        assert!(after.error_message.is_none());
    }

    #[tokio::test]
    async fn retry_does_not_apply_to_queued() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        assert!(!store.retry(&job.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_row_and_cascades_attempts() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        store.insert_attempt(&job.id, 1, RuntimeProfile::Primary).await.unwrap();

        let deleted = store.delete(&job.id).await.unwrap();
        assert!(deleted.is_some());
        assert!(store.get(&job.id).await.unwrap().is_none());
        assert!(store.list_attempts(&job.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_id_returns_none() {
        let (store, _dir) = temp_store().await;
        assert!(store.delete("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finish_ok_requires_in_flight_status() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        let data = FinishOk {
            title: Some("Title".into()),
            ..Default::default()
        };
        assert!(!store.finish_ok(&job.id, &data).await.unwrap());

        store.begin(&job.id, 1, 1, RuntimeProfile::Primary).await.unwrap();
        assert!(store.finish_ok(&job.id, &data).await.unwrap());
        let completed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
        assert_eq!(completed.progress_percent, Some(100.0));
        assert_eq!(completed.title.as_deref(), Some("Title"));
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn finish_ok_clears_stale_error_and_transfer_fields() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        assert!(store.begin(&job.id, 1, 1, RuntimeProfile::Primary).await.unwrap());
        store
            .update_progress(&job.id, Some(12.0), 100, Some(1000), Some(50.0), Some(20))
            .await
            .unwrap();
        assert!(store.finish_fail(&job.id, "boom", "HttpError", RuntimeProfile::Primary, 1).await.unwrap());
        assert!(store.retry(&job.id).await.unwrap());
        assert!(store.begin(&job.id, 2, 2, RuntimeProfile::Primary).await.unwrap());

        let data = FinishOk {
            title: Some("Title".into()),
            ..Default::default()
        };
        assert!(store.finish_ok(&job.id, &data).await.unwrap());

        let completed = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
        assert!(completed.error_message.is_none());
        assert!(completed.last_exception_type.is_none());
        assert!(completed.speed_bps.is_none());
        assert!(completed.eta_seconds.is_none());
    }

    #[tokio::test]
    async fn list_respects_status_filter_and_pagination() {
        let (store, _dir) = temp_store().await;
        for i in 0..3 {
            store
                .enqueue(&format!("https://example.com/{i}"), Preset::Best)
                .await
                .unwrap();
        }
        let query = JobListQuery {
            page: 1,
            per_page: 2,
            status: Some(JobStatus::Queued),
            q: None,
            sort: SortOrder::CreatedAsc,
            uploader: None,
        };
        let page = store.list(&query).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.jobs.len(), 2);
    }

    #[tokio::test]
    async fn queued_ids_is_fifo_by_created_at() {
        let (store, _dir) = temp_store().await;
        let first = store.enqueue("https://example.com/1", Preset::Best).await.unwrap();
        let second = store.enqueue("https://example.com/2", Preset::Best).await.unwrap();
        let ids = store.queued_ids(10).await.unwrap();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn finalize_attempt_sets_ended_at_and_status() {
        let (store, _dir) = temp_store().await;
        let job = store.enqueue("https://example.com/x", Preset::Best).await.unwrap();
        let attempt_id = store.insert_attempt(&job.id, 1, RuntimeProfile::Primary).await.unwrap();
        store
            .finalize_attempt(attempt_id, AttemptStatus::Paused, Some("paused_by_user"), Some("PauseRequestedError"))
            .await
            .unwrap();
        let attempts = store.list_attempts(&job.id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, AttemptStatus::Paused);
        assert!(attempts[0].ended_at.is_some());
    }

    #[tokio::test]
    async fn check_read_write_succeeds_against_fresh_db() {
        let (store, _dir) = temp_store().await;
        store.check_read_write().await.unwrap();
    }

    #[tokio::test]
    async fn recover_interrupted_marks_only_downloading_rows() {
        let (store, _dir) = temp_store().await;
        let stuck = store.enqueue("https://example.com/stuck", Preset::Best).await.unwrap();
        let queued = store.enqueue("https://example.com/queued", Preset::Best).await.unwrap();
        assert!(store.begin(&stuck.id, 1, 1, RuntimeProfile::Primary).await.unwrap());

        let count = store.recover_interrupted().await.unwrap();
        assert_eq!(count, 1);

        let recovered = store.get(&stuck.id).await.unwrap().unwrap();
        assert_eq!(recovered.status, JobStatus::Failed);
        assert_eq!(recovered.error_message.as_deref(), Some("interrupted_by_restart"));

        let untouched = store.get(&queued.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, JobStatus::Queued);

        assert_eq!(store.recover_interrupted().await.unwrap(), 0);
    }
}
