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

//! The HTTP control plane (spec.md §6.2): one axum router over a
//! [`vodkeep_api_models::ControlPlane`] trait object, so this crate never
//! depends on `vodkeep-app`'s store or worker-pool types directly.

mod error;
mod metrics_layer;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderName;
use axum::http::Method;
use axum::http::header::CONTENT_TYPE;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use vodkeep_api_models::ControlPlane;
use vodkeep_fsops::StorageRoot;
use vodkeep_telemetry::Metrics;

use crate::metrics_layer::HttpMetricsLayer;
use crate::state::ApiState;

/// Request id header every response carries (spec.md §6.2).
const REQUEST_ID_HEADER: &str = "x-request-id";

/// The HTTP control plane server: a built axum [`axum::Router`] plus the
/// state it closes over.
pub struct ApiServer {
    router: axum::Router,
}

impl ApiServer {
    /// Build the router. Infallible: nothing here can fail before a socket
    /// is bound.
    #[must_use]
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        metrics: Metrics,
        min_free_disk_mb: u64,
        storage_root: StorageRoot,
    ) -> Self {
        let state = Arc::new(ApiState {
            control_plane,
            metrics: metrics.clone(),
            min_free_disk_mb,
            storage_root,
        });

        let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([CONTENT_TYPE, request_id_header.clone()]);

        let router = routes::build(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(HttpMetricsLayer::new(metrics))
                    .layer(PropagateRequestIdLayer::new(request_id_header))
                    .layer(cors),
            );

        Self { router }
    }

    /// Serve the router on `addr` until the process is terminated or the
    /// listener errors.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the listener fails to bind or
    /// the server loop exits unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        tracing::info!(%addr, "starting HTTP control plane listener");
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router.into_make_service()).await
    }

    #[cfg(test)]
    pub(crate) fn router(&self) -> axum::Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;
    use vodkeep_api_models::ControlPlaneError;
    use vodkeep_domain::{Job, JobListQuery, JobPage, JobStatus, Preset, RuntimeProfile, StatusCounts};
    use vodkeep_extractor::{ProbeInfo, RuntimeDiagnostics};

    use super::*;

    struct StubControlPlane {
        jobs: Mutex<HashMap<String, Job>>,
    }

    impl StubControlPlane {
        fn new() -> Self {
            Self { jobs: Mutex::new(HashMap::new()) }
        }

        fn seeded(job: Job) -> Self {
            let mut jobs = HashMap::new();
            jobs.insert(job.id.clone(), job);
            Self { jobs: Mutex::new(jobs) }
        }
    }

    fn sample_job(id: &str, status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id: id.to_string(),
            requested_url: "https://youtube.com/watch?v=abc123".to_string(),
            preset: Preset::Best,
            created_at: now,
            canonical_url: None,
            webpage_url: None,
            video_id: None,
            extractor: None,
            extractor_key: None,
            title: None,
            uploader: None,
            uploader_id: None,
            channel: None,
            channel_id: None,
            duration_seconds: None,
            upload_date: None,
            thumbnail_remote_url: None,
            media_local_path: None,
            media_ext: None,
            thumbnail_local_path: None,
            status,
            queued_at: Some(now),
            started_at: None,
            paused_at: None,
            completed_at: None,
            failed_at: None,
            updated_at: now,
            progress_percent: None,
            downloaded_bytes: 0,
            total_bytes: None,
            speed_bps: None,
            eta_seconds: None,
            attempt_current: 0,
            attempt_max: 1,
            runtime_profile: RuntimeProfile::Primary,
            last_exception_type: None,
            error_message: None,
            metadata_json: None,
        }
    }

    #[async_trait]
    impl ControlPlane for StubControlPlane {
        async fn enqueue(&self, url: &str, preset: &str) -> Result<Job, ControlPlaneError> {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ControlPlaneError::InvalidUrl);
            }
            Preset::parse(preset).map_err(|_| ControlPlaneError::InvalidPreset {
                preset: preset.to_string(),
            })?;
            let mut job = sample_job(&uuid::Uuid::new_v4().to_string(), JobStatus::Queued);
            job.requested_url = url.to_string();
            job.preset = Preset::parse(preset).expect("validated above");
            self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
            Ok(job)
        }

        async fn get(&self, id: &str) -> Result<Job, ControlPlaneError> {
            self.jobs
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })
        }

        async fn get_by_filename(&self, filename: &str) -> Result<Job, ControlPlaneError> {
            self.jobs
                .lock()
                .unwrap()
                .values()
                .find(|job| {
                    job.media_local_path.as_deref() == Some(filename)
                        || job.thumbnail_local_path.as_deref() == Some(filename)
                })
                .cloned()
                .ok_or_else(|| ControlPlaneError::NotFound { id: filename.to_string() })
        }

        async fn list(&self, _query: JobListQuery) -> Result<JobPage, ControlPlaneError> {
            let jobs: Vec<Job> = self.jobs.lock().unwrap().values().cloned().collect();
            let total = jobs.len() as i64;
            Ok(JobPage { jobs, total })
        }

        async fn pause(&self, id: &str) -> Result<Job, ControlPlaneError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.get_mut(id).ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })?;
            if job.status != JobStatus::Queued {
                return Err(ControlPlaneError::JobNotActiveOrNotQueued { id: id.to_string() });
            }
            job.status = JobStatus::Paused;
            Ok(job.clone())
        }

        async fn resume(&self, id: &str) -> Result<Job, ControlPlaneError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.get_mut(id).ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })?;
            if job.status != JobStatus::Paused {
                return Err(ControlPlaneError::InvalidState { id: id.to_string() });
            }
            job.status = JobStatus::Queued;
            Ok(job.clone())
        }

        async fn retry(&self, id: &str) -> Result<Job, ControlPlaneError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.get_mut(id).ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })?;
            if !matches!(job.status, JobStatus::Failed | JobStatus::Paused) {
                return Err(ControlPlaneError::InvalidState { id: id.to_string() });
            }
            job.status = JobStatus::Queued;
            job.attempt_max += 1;
            Ok(job.clone())
        }

        async fn delete(&self, id: &str) -> Result<Job, ControlPlaneError> {
            self.jobs
                .lock()
                .unwrap()
                .remove(id)
                .ok_or_else(|| ControlPlaneError::NotFound { id: id.to_string() })
        }

        async fn probe(&self, url: &str) -> Result<ProbeInfo, ControlPlaneError> {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ControlPlaneError::InvalidUrl);
            }
            Ok(ProbeInfo {
                title: Some("Sample".to_string()),
                ext: Some("mp4".to_string()),
                video_id: Some("abc123".to_string()),
                uploader: None,
                duration_seconds: None,
                thumbnail_remote_url: None,
            })
        }

        async fn diagnostics(&self) -> RuntimeDiagnostics {
            RuntimeDiagnostics {
                js_runtime: "node".to_string(),
                js_runtime_path: "/usr/bin/node".into(),
                ffmpeg_path: None,
                youtube_fallback_enabled: false,
                max_concurrent_downloads: 4,
            }
        }

        async fn status_counts(&self) -> Result<StatusCounts, ControlPlaneError> {
            Ok(StatusCounts::default())
        }

        async fn check_store_read_write(&self) -> Result<(), ControlPlaneError> {
            Ok(())
        }
    }

    fn build_server(control_plane: StubControlPlane) -> (ApiServer, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path()).unwrap();
        let metrics = Metrics::new().unwrap();
        let server = ApiServer::new(Arc::new(control_plane), metrics, 512, root);
        (server, dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn download_enqueues_and_returns_202() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder()
            .method("POST")
            .uri("/download")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("u=https://youtube.com/watch?v=abc123&preset=best"))
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = body_json(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["status"], "queued");
    }

    #[tokio::test]
    async fn download_rejects_invalid_preset_with_400() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder()
            .method("POST")
            .uri("/download")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("u=https://youtube.com/watch?v=abc123&preset=bogus"))
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_preset");
    }

    #[tokio::test]
    async fn status_unknown_job_returns_404() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder()
            .uri("/api/status/missing")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pause_then_resume_round_trips() {
        let job = sample_job("job-1", JobStatus::Queued);
        let (server, _dir) = build_server(StubControlPlane::seeded(job));

        let pause_req = Request::builder()
            .method("POST")
            .uri("/api/jobs/job-1/pause")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(pause_req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["job"]["status"], "paused");

        let resume_req = Request::builder()
            .method("POST")
            .uri("/api/jobs/job-1/resume")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(resume_req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["job"]["status"], "queued");
    }

    #[tokio::test]
    async fn retry_on_a_queued_job_returns_409() {
        let job = sample_job("job-1", JobStatus::Queued);
        let (server, _dir) = build_server(StubControlPlane::seeded(job));
        let request = Request::builder()
            .method("POST")
            .uri("/api/jobs/job-1/retry")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn healthz_is_always_ok() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readyz_passes_against_a_writable_tempdir() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder().uri("/readyz").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn files_traversal_above_root_is_forbidden() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder()
            .uri("/files/../../etc/passwd")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn catch_all_reconstructs_a_collapsed_scheme_and_enqueues() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder()
            .uri("/http:/youtube.com/watch?v=abc123")
            .body(Body::empty())
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn presets_lists_the_closed_set() {
        let (server, _dir) = build_server(StubControlPlane::new());
        let request = Request::builder().uri("/api/presets").body(Body::empty()).unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }
}
