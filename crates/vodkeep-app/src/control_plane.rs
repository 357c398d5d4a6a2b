//! Implementation of [`vodkeep_api_models::ControlPlane`] (spec §4.4):
//! the single seam the HTTP layer calls into, wrapping the store and the
//! in-memory active map.

use async_trait::async_trait;
use vodkeep_api_models::{ControlPlane, ControlPlaneError};
use vodkeep_domain::{Job, JobListQuery, JobPage, Preset, StatusCounts};
use vodkeep_extractor::{ExtractorAdapter, ProbeInfo, RuntimeDiagnostics};
use vodkeep_fsops::StorageRoot;
use vodkeep_store::JobStore;
use vodkeep_telemetry::Metrics;

use std::sync::Arc;

use crate::active::ActiveMap;

/// The control-plane wiring: store + active map + storage root +
/// extractor (for `probe`) + static diagnostics values.
pub struct AppControlPlane {
    store: JobStore,
    active: ActiveMap,
    root: StorageRoot,
    extractor: Arc<dyn ExtractorAdapter>,
    metrics: Metrics,
    diagnostics: RuntimeDiagnostics,
}

impl AppControlPlane {
    /// Wrap the given dependencies behind the [`ControlPlane`] contract.
    #[must_use]
    pub fn new(
        store: JobStore,
        active: ActiveMap,
        root: StorageRoot,
        extractor: Arc<dyn ExtractorAdapter>,
        metrics: Metrics,
        diagnostics: RuntimeDiagnostics,
    ) -> Self {
        Self {
            store,
            active,
            root,
            extractor,
            metrics,
            diagnostics,
        }
    }
}

#[async_trait]
impl ControlPlane for AppControlPlane {
    async fn enqueue(&self, url: &str, preset: &str) -> Result<Job, ControlPlaneError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ControlPlaneError::InvalidUrl);
        }
        let preset = Preset::parse(preset).map_err(|_| ControlPlaneError::InvalidPreset {
            preset: preset.to_string(),
        })?;

        let job = self
            .store
            .enqueue(url, preset)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?;
        self.metrics.job_queued();
        Ok(job)
    }

    async fn get(&self, id: &str) -> Result<Job, ControlPlaneError> {
        self.store
            .get(id)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?
            .ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })
    }

    async fn get_by_filename(&self, filename: &str) -> Result<Job, ControlPlaneError> {
        self.store
            .get_by_filename(filename)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?
            .ok_or_else(|| ControlPlaneError::NotFound {
                id: filename.to_string(),
            })
    }

    async fn list(&self, query: JobListQuery) -> Result<JobPage, ControlPlaneError> {
        self.store
            .list(&query)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))
    }

    async fn pause(&self, id: &str) -> Result<Job, ControlPlaneError> {
        let applied = self
            .store
            .pause_queued(id)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?;

        if applied {
            self.metrics.job_paused();
        } else {
            let Some(cancel) = self.active.cancel_signal(id) else {
                // Distinguish an unknown id (404) from one that exists
                // but is neither queued nor active (409).
                self.get(id).await?;
                return Err(ControlPlaneError::JobNotActiveOrNotQueued { id: id.to_string() });
            };
            cancel.set();
            self.store
                .pause_force(id)
                .await
                .map_err(|err| ControlPlaneError::Internal(err.to_string()))?;
        }

        self.get(id).await
    }

    async fn resume(&self, id: &str) -> Result<Job, ControlPlaneError> {
        let applied = self
            .store
            .resume(id)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?;
        if !applied {
            // Distinguish an unknown id (404) from one that exists but
            // is not paused (409).
            self.get(id).await?;
            return Err(ControlPlaneError::InvalidState { id: id.to_string() });
        }
        self.get(id).await
    }

    async fn retry(&self, id: &str) -> Result<Job, ControlPlaneError> {
        let applied = self
            .store
            .retry(id)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?;
        if !applied {
            // Distinguish an unknown id (404) from one that exists but
            // is neither failed nor paused (409).
            self.get(id).await?;
            return Err(ControlPlaneError::InvalidState { id: id.to_string() });
        }
        self.get(id).await
    }

    async fn delete(&self, id: &str) -> Result<Job, ControlPlaneError> {
        if let Some(cancel) = self.active.cancel_signal(id) {
            cancel.set();
        }

        let job = self
            .store
            .delete(id)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))?
            .ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })?;

        vodkeep_fsops::cleanup_job_artifacts(
            &self.root,
            job.media_local_path.as_deref(),
            job.thumbnail_local_path.as_deref(),
        );

        Ok(job)
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, ControlPlaneError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ControlPlaneError::InvalidUrl);
        }
        self.extractor
            .probe(url)
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))
    }

    async fn diagnostics(&self) -> RuntimeDiagnostics {
        self.diagnostics.clone()
    }

    async fn status_counts(&self) -> Result<StatusCounts, ControlPlaneError> {
        self.store
            .count_by_status()
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))
    }

    async fn check_store_read_write(&self) -> Result<(), ControlPlaneError> {
        self.store
            .check_read_write()
            .await
            .map_err(|err| ControlPlaneError::Internal(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use vodkeep_extractor::{ExtractOptions, ExtractorError, ProgressHook};

    use super::*;

    /// Never actually called by the tests below; `enqueue`/`pause`/
    /// `resume`/`retry` never reach the extractor.
    struct UnusedExtractor;

    #[async_trait]
    impl ExtractorAdapter for UnusedExtractor {
        async fn extract(
            &self,
            _url: &str,
            _options: &ExtractOptions,
            _hook: ProgressHook,
        ) -> Result<vodkeep_extractor::InfoDict, ExtractorError> {
            unreachable!("not exercised by control-plane tests")
        }

        async fn probe(&self, _url: &str) -> Result<ProbeInfo, ExtractorError> {
            unreachable!("not exercised by control-plane tests")
        }
    }

    async fn plane() -> (AppControlPlane, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = vodkeep_store::connect(&dir.path().join("jobs.sqlite3"))
            .await
            .expect("connect");
        let store = JobStore::new(pool);
        let root = StorageRoot::new(dir.path().join("media")).expect("storage root");
        let diagnostics = RuntimeDiagnostics {
            js_runtime: "node".into(),
            js_runtime_path: "/usr/bin/node".into(),
            ffmpeg_path: None,
            youtube_fallback_enabled: true,
            max_concurrent_downloads: 2,
        };
        let plane = AppControlPlane::new(
            store,
            ActiveMap::new(),
            root,
            Arc::new(UnusedExtractor),
            Metrics::new().expect("metrics"),
            diagnostics,
        );
        (plane, dir)
    }

    #[tokio::test]
    async fn pause_resume_retry_on_unknown_id_is_not_found() {
        let (plane, _dir) = plane().await;
        assert!(matches!(
            plane.pause("does-not-exist").await,
            Err(ControlPlaneError::NotFound { .. })
        ));
        assert!(matches!(
            plane.resume("does-not-exist").await,
            Err(ControlPlaneError::NotFound { .. })
        ));
        assert!(matches!(
            plane.retry("does-not-exist").await,
            Err(ControlPlaneError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn resume_and_retry_on_queued_job_is_invalid_state() {
        let (plane, _dir) = plane().await;
        let job = plane.enqueue("https://example.com/x", "best").await.unwrap();

        assert!(matches!(
            plane.resume(&job.id).await,
            Err(ControlPlaneError::InvalidState { .. })
        ));
        assert!(matches!(
            plane.retry(&job.id).await,
            Err(ControlPlaneError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn pause_on_queued_job_transitions_and_counts_metric() {
        let (plane, _dir) = plane().await;
        let job = plane.enqueue("https://example.com/x", "best").await.unwrap();

        let paused = plane.pause(&job.id).await.unwrap();
        assert_eq!(paused.status, vodkeep_domain::JobStatus::Paused);

        let rendered = plane.metrics.render().expect("render");
        assert!(rendered.contains("downloader_jobs_paused_total 1"));
    }
}
