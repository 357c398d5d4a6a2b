//! Prometheus-backed metrics registry (spec §6.5). Metric names here are
//! part of the contract — do not rename without checking §6.5.

use std::sync::Arc;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::error::TelemetryError;

/// Shared Prometheus registry and the job-lifecycle/HTTP collectors
/// spec §6.5 names.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    jobs_queued_total: IntCounter,
    jobs_started_total: IntCounter,
    jobs_completed_total: IntCounter,
    jobs_retried_total: IntCounter,
    jobs_paused_total: IntCounter,
    jobs_failed_total: IntCounterVec,
    downloaded_bytes_total: IntCounter,
    active_jobs: IntGauge,
    queue_depth: IntGauge,
    job_duration_seconds: HistogramVec,
    http_request_duration_seconds: HistogramVec,
    http_requests_total: IntCounterVec,
}

impl Metrics {
    /// Construct a new registry with every collector named in §6.5
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::MetricsRegister`] if a collector cannot
    /// be built or registered.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let jobs_queued_total =
            counter("downloader_jobs_queued_total", "Jobs admitted into the queue")?;
        let jobs_started_total =
            counter("downloader_jobs_started_total", "Jobs handed to a worker")?;
        let jobs_completed_total = counter(
            "downloader_jobs_completed_total",
            "Jobs that reached the completed state",
        )?;
        let jobs_retried_total = counter(
            "downloader_jobs_retried_total",
            "Jobs re-queued via the retry transition",
        )?;
        let jobs_paused_total =
            counter("downloader_jobs_paused_total", "Jobs that reached the paused state")?;
        let downloaded_bytes_total = counter(
            "downloader_downloaded_bytes_total",
            "Total bytes reported downloaded across all jobs",
        )?;

        let jobs_failed_total = counter_vec(
            "downloader_jobs_failed_total",
            "Jobs that reached the failed state, by failure reason",
            &["reason"],
        )?;

        let active_jobs = gauge("downloader_active_jobs", "Workers currently in flight")?;
        let queue_depth = gauge("downloader_queue_depth", "Jobs currently queued")?;

        let job_duration_seconds = histogram_vec(
            "downloader_job_duration_seconds",
            "Wall-clock seconds from worker start to terminal state",
            &["preset", "status"],
        )?;
        let http_request_duration_seconds = histogram_vec(
            "http_request_duration_seconds",
            "HTTP request handling latency",
            &["method", "route"],
        )?;
        let http_requests_total = counter_vec(
            "http_requests_total",
            "HTTP requests handled, by method/route/status",
            &["method", "route", "status"],
        )?;

        register(&registry, jobs_queued_total.clone(), "downloader_jobs_queued_total")?;
        register(&registry, jobs_started_total.clone(), "downloader_jobs_started_total")?;
        register(&registry, jobs_completed_total.clone(), "downloader_jobs_completed_total")?;
        register(&registry, jobs_retried_total.clone(), "downloader_jobs_retried_total")?;
        register(&registry, jobs_paused_total.clone(), "downloader_jobs_paused_total")?;
        register(&registry, jobs_failed_total.clone(), "downloader_jobs_failed_total")?;
        register(&registry, downloaded_bytes_total.clone(), "downloader_downloaded_bytes_total")?;
        register(&registry, active_jobs.clone(), "downloader_active_jobs")?;
        register(&registry, queue_depth.clone(), "downloader_queue_depth")?;
        register(&registry, job_duration_seconds.clone(), "downloader_job_duration_seconds")?;
        register(
            &registry,
            http_request_duration_seconds.clone(),
            "http_request_duration_seconds",
        )?;
        register(&registry, http_requests_total.clone(), "http_requests_total")?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                jobs_queued_total,
                jobs_started_total,
                jobs_completed_total,
                jobs_retried_total,
                jobs_paused_total,
                jobs_failed_total,
                downloaded_bytes_total,
                active_jobs,
                queue_depth,
                job_duration_seconds,
                http_request_duration_seconds,
                http_requests_total,
            }),
        })
    }

    /// Record a job admitted into the queue.
    pub fn job_queued(&self) {
        self.inner.jobs_queued_total.inc();
    }

    /// Record a job handed to a worker.
    pub fn job_started(&self) {
        self.inner.jobs_started_total.inc();
    }

    /// Record a job reaching `completed`.
    pub fn job_completed(&self) {
        self.inner.jobs_completed_total.inc();
    }

    /// Record a job re-queued via `retry`.
    pub fn job_retried(&self) {
        self.inner.jobs_retried_total.inc();
    }

    /// Record a job reaching `paused`.
    pub fn job_paused(&self) {
        self.inner.jobs_paused_total.inc();
    }

    /// Record a job reaching `failed`, labelled with its classified
    /// reason (§4.3: `forbidden|network|unavailable|other`).
    pub fn job_failed(&self, reason: &str) {
        self.inner.jobs_failed_total.with_label_values(&[reason]).inc();
    }

    /// Add `delta` bytes to the running downloaded-bytes counter. Callers
    /// must clamp negative steps to zero before calling this.
    pub fn add_downloaded_bytes(&self, delta: u64) {
        self.inner.downloaded_bytes_total.inc_by(delta);
    }

    /// Set the current count of workers holding a lease.
    pub fn set_active_jobs(&self, count: i64) {
        self.inner.active_jobs.set(count);
    }

    /// Set the current queue depth.
    pub fn set_queue_depth(&self, count: i64) {
        self.inner.queue_depth.set(count);
    }

    /// Observe a job's total wall-clock duration, labelled by preset and
    /// terminal status.
    pub fn observe_job_duration(&self, preset: &str, status: &str, seconds: f64) {
        self.inner
            .job_duration_seconds
            .with_label_values(&[preset, status])
            .observe(seconds);
    }

    /// Record one handled HTTP request.
    pub fn observe_http_request(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, route])
            .observe(seconds);
        self.inner
            .http_requests_total
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
    }

    /// Render the registry in Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::MetricsEncode`] or
    /// [`TelemetryError::MetricsUtf8`] if encoding fails.
    pub fn render(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter, TelemetryError> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn counter_vec(
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec, TelemetryError> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge, TelemetryError> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn histogram_vec(
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<HistogramVec, TelemetryError> {
    HistogramVec::new(HistogramOpts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn register<C: prometheus::core::Collector + 'static>(
    registry: &Registry,
    collector: C,
    name: &'static str,
) -> Result<(), TelemetryError> {
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.job_queued();
        metrics.job_failed("forbidden");
        metrics.add_downloaded_bytes(1000);
        metrics.set_active_jobs(2);
        metrics.observe_job_duration("best", "completed", 12.5);
        metrics.observe_http_request("GET", "/api/status/:id", 200, 0.01);

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("downloader_jobs_queued_total"));
        assert!(rendered.contains("downloader_jobs_failed_total"));
        assert!(rendered.contains(r#"reason="forbidden""#));
        assert!(rendered.contains("downloader_downloaded_bytes_total"));
        assert!(rendered.contains("downloader_active_jobs"));
        assert!(rendered.contains("downloader_job_duration_seconds"));
        assert!(rendered.contains("http_requests_total"));
    }
}
