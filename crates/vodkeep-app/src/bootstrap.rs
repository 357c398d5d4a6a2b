//! Boot sequence: resolve settings, open the store, run recovery, start
//! the scheduler, and serve the HTTP control plane.

use std::sync::Arc;

use tracing::info;
use vodkeep_config::Settings;
use vodkeep_extractor::{ExtractorAdapter, NativeExtractor, RuntimeDiagnostics};
use vodkeep_fsops::StorageRoot;
use vodkeep_telemetry::{LoggingConfig, Metrics};

use crate::active::ActiveMap;
use crate::control_plane::AppControlPlane;
use crate::error::{AppError, AppResult};
use crate::worker::WorkerContext;

/// Dependencies assembled from the environment, split out from
/// [`run_app_with`] so tests can construct a variant directly.
pub(crate) struct BootstrapDependencies {
    settings: Settings,
    metrics: Metrics,
}

impl BootstrapDependencies {
    /// Resolve settings and construct the metrics registry from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the environment is missing or
    /// invalid, or [`AppError::Telemetry`] if the metrics registry fails
    /// to construct.
    pub(crate) fn from_env() -> AppResult<Self> {
        let settings = vodkeep_config::from_env().map_err(|source| AppError::Config { source })?;
        let metrics = Metrics::new().map_err(|source| AppError::Telemetry { source })?;
        Ok(Self { settings, metrics })
    }
}

/// Entry point for the application boot sequence.
///
/// # Errors
///
/// Returns an error if any dependency fails to construct or the HTTP
/// server exits with an I/O error.
pub async fn run_app() -> AppResult<()> {
    let deps = BootstrapDependencies::from_env()?;
    run_app_with(deps).await
}

async fn run_app_with(deps: BootstrapDependencies) -> AppResult<()> {
    let BootstrapDependencies { settings, metrics } = deps;

    vodkeep_telemetry::init_logging(&LoggingConfig {
        level: &settings.log_level,
        ..LoggingConfig::default()
    })
    .map_err(|source| AppError::Telemetry { source })?;

    info!("vodkeep bootstrap starting");

    let pool = vodkeep_store::connect(&settings.sqlite_path)
        .await
        .map_err(|source| AppError::Store { source })?;
    let store = vodkeep_store::JobStore::new(pool);

    let recovered = crate::recovery::recover_interrupted(&store)
        .await
        .map_err(|source| AppError::Store { source })?;
    if recovered > 0 {
        info!(count = recovered, "reconciled interrupted jobs at startup");
    }

    let root = StorageRoot::new(&settings.base_download_dir).map_err(|source| AppError::FsOps { source })?;

    let extractor: Arc<dyn ExtractorAdapter> = Arc::new(NativeExtractor::new(
        settings.ytdlp_js_runtime_path.clone(),
    ));

    let active = ActiveMap::new();

    let diagnostics = RuntimeDiagnostics {
        js_runtime: settings.ytdlp_js_runtime.clone(),
        js_runtime_path: settings.ytdlp_js_runtime_path.clone(),
        ffmpeg_path: settings.ytdlp_ffmpeg_path.clone(),
        youtube_fallback_enabled: settings.ytdlp_enable_youtube_fallback,
        max_concurrent_downloads: settings.max_concurrent_downloads,
    };

    let control_plane: Arc<dyn vodkeep_api_models::ControlPlane> = Arc::new(AppControlPlane::new(
        store.clone(),
        active.clone(),
        root.clone(),
        Arc::clone(&extractor),
        metrics.clone(),
        diagnostics,
    ));

    let api_root = root.clone();

    let worker_ctx = Arc::new(WorkerContext {
        store: store.clone(),
        extractor,
        root,
        metrics: metrics.clone(),
        flush_interval: settings.job_progress_flush_interval,
        js_runtime: settings.ytdlp_js_runtime.clone(),
        js_runtime_path: settings.ytdlp_js_runtime_path.clone(),
        ffmpeg_location: settings.ytdlp_ffmpeg_path.clone(),
        youtube_fallback_enabled: settings.ytdlp_enable_youtube_fallback,
    });

    let scheduler_handle = tokio::spawn(crate::scheduler::run(
        store,
        active,
        metrics.clone(),
        worker_ctx,
        settings.max_concurrent_downloads,
    ));

    let api = vodkeep_api::ApiServer::new(control_plane, metrics, settings.min_free_disk_mb, api_root);

    let addr: std::net::SocketAddr = settings
        .http_socket_addr()
        .parse()
        .map_err(|_| AppError::InvalidBindAddr {
            value: settings.http_socket_addr(),
        })?;

    info!(%addr, "starting HTTP control plane");
    let serve_result = api.serve(addr).await;

    scheduler_handle.abort();
    serve_result.map_err(|source| AppError::Http { source })?;
    info!("HTTP control plane shut down");
    Ok(())
}
