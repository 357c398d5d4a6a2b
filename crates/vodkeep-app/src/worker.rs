//! The worker (spec §4.3): drives one job end-to-end across its attempt
//! plan, aggregating progress and reacting to cooperative cancellation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use vodkeep_domain::{AttemptStatus, Job, Preset, RuntimeProfile};
use vodkeep_extractor::{
    CancelSignal, ExtractOptions, ExtractorAdapter, ExtractorError, InfoDict, ProgressEvent,
    ProgressHook,
};
use vodkeep_fsops::StorageRoot;
use vodkeep_store::{FinishOk, JobStore};
use vodkeep_telemetry::Metrics;

use crate::metadata::serialize_metadata;

/// Error-message tokens that make a primary-profile failure retryable
/// across attempts (spec §4.3: "Retryable predicate").
const RETRYABLE_TOKENS: [&str; 5] = [
    "403",
    "forbidden",
    "sabr",
    "missing a url",
    "unable to download video data",
];

/// Everything a worker needs that outlives any single job (spec §4.6,
/// §6.4): the store, the extractor adapter, the storage root, metrics,
/// and the resolved extractor runtime options.
pub(crate) struct WorkerContext {
    /// The durable job/attempt store.
    pub(crate) store: JobStore,
    /// The external extraction engine.
    pub(crate) extractor: Arc<dyn ExtractorAdapter>,
    /// The storage root artifacts are resolved and confined to.
    pub(crate) root: StorageRoot,
    /// The shared metrics registry.
    pub(crate) metrics: Metrics,
    /// Minimum interval between `downloading` progress flushes.
    pub(crate) flush_interval: Duration,
    /// JS runtime interpreter name, resolved from configuration.
    pub(crate) js_runtime: String,
    /// Path to the JS runtime interpreter binary.
    pub(crate) js_runtime_path: PathBuf,
    /// Optional explicit `ffmpeg` binary location.
    pub(crate) ffmpeg_location: Option<PathBuf>,
    /// Whether the YouTube fallback profile may be used.
    pub(crate) youtube_fallback_enabled: bool,
}

/// One step of a job's attempt plan (spec §4.3 step 2).
#[derive(Debug, Clone, Copy)]
struct PlanStep {
    attempt_no: i32,
    profile: RuntimeProfile,
}

/// Build the attempt plan: always `[primary]`, plus `fallback` iff the
/// URL host matches YouTube and the fallback is enabled.
fn build_attempt_plan(url: &str, youtube_fallback_enabled: bool) -> Vec<PlanStep> {
    let mut plan = vec![PlanStep {
        attempt_no: 1,
        profile: RuntimeProfile::Primary,
    }];
    if youtube_fallback_enabled && is_youtube_host(url) {
        plan.push(PlanStep {
            attempt_no: 2,
            profile: RuntimeProfile::Fallback,
        });
    }
    plan
}

/// Whether `url`'s host is a YouTube domain (`youtube.com`, any
/// subdomain, or `youtu.be`).
fn is_youtube_host(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be"
}

/// Whether a primary-profile failure should advance to the next attempt
/// in the plan rather than finishing the job (spec §4.3).
fn is_retryable(profile: RuntimeProfile, attempt_no: i32, plan_len: usize, message: &str) -> bool {
    if profile != RuntimeProfile::Primary {
        return false;
    }
    if usize::try_from(attempt_no).unwrap_or(usize::MAX) >= plan_len {
        return false;
    }
    let lower = message.to_ascii_lowercase();
    RETRYABLE_TOKENS.iter().any(|token| lower.contains(token))
}

/// Classify a failure message for the `reason` metric label (spec §4.3).
fn classify_failure_reason(message: &str) -> &'static str {
    let lower = message.to_ascii_lowercase();
    if lower.contains("403") || lower.contains("forbidden") {
        "forbidden"
    } else if lower.contains("network") {
        "network"
    } else if lower.contains("not available") {
        "unavailable"
    } else {
        "other"
    }
}

fn build_extract_options(ctx: &WorkerContext, preset: Preset, profile: RuntimeProfile) -> ExtractOptions {
    ExtractOptions {
        outtmpl: "%(title).200B [%(id)s].%(ext)s".to_string(),
        restrictfilenames: true,
        format: preset.format_selector().to_string(),
        merge_output_format: (!preset.is_audio_only()).then(|| "mp4".to_string()),
        audio_format: preset.is_audio_only().then(|| "m4a".to_string()),
        writethumbnail: true,
        writeinfojson: true,
        retries: ExtractOptions::MIN_RETRIES,
        concurrent_fragment_downloads: ExtractOptions::CONCURRENT_FRAGMENT_DOWNLOADS,
        js_runtime: ctx.js_runtime.clone(),
        js_runtime_path: ctx.js_runtime_path.clone(),
        ffmpeg_location: ctx.ffmpeg_location.clone(),
        extractor_args_youtube_player_client: (profile == RuntimeProfile::Fallback)
            .then_some(ExtractOptions::FALLBACK_PLAYER_CLIENTS.to_vec()),
    }
}

struct HookState {
    last_bytes: i64,
    last_flush: Instant,
}

/// Build the progress hook for one attempt (spec §4.3.1). Holds its own
/// rate-limit and byte-delta state across invocations within the
/// attempt; a fresh hook is built per attempt.
fn build_progress_hook(
    store: JobStore,
    metrics: Metrics,
    job_id: String,
    cancel: CancelSignal,
    flush_interval: Duration,
) -> ProgressHook {
    let state = Arc::new(Mutex::new(HookState {
        last_bytes: 0,
        last_flush: Instant::now() - flush_interval,
    }));

    Arc::new(move |event: ProgressEvent| {
        let store = store.clone();
        let metrics = metrics.clone();
        let job_id = job_id.clone();
        let cancel = cancel.clone();
        let state = Arc::clone(&state);
        let flush_interval = flush_interval;

        Box::pin(async move {
            if cancel.is_set() {
                return Err(ExtractorError::PauseRequested);
            }

            match event.status.as_str() {
                "finished" => {
                    let downloaded = event.downloaded_bytes.unwrap_or(0);
                    let total = event.total_bytes.or(Some(downloaded));
                    store
                        .update_progress(&job_id, Some(100.0), downloaded, total, None, Some(0))
                        .await
                        .map_err(|err| ExtractorError::Protocol(err.to_string()))?;

                    let mut guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    let delta = downloaded.saturating_sub(guard.last_bytes).max(0);
                    metrics.add_downloaded_bytes(u64::try_from(delta).unwrap_or(0));
                    guard.last_bytes = downloaded;
                    Ok(())
                }
                "downloading" => {
                    let mut guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    if guard.last_flush.elapsed() < flush_interval {
                        return Ok(());
                    }

                    let downloaded = event.downloaded_bytes.unwrap_or(0);
                    let total = event.total_or_estimate();
                    let percent = total.filter(|total| *total > 0).map(|total| {
                        (downloaded as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
                    });

                    store
                        .update_progress(&job_id, percent, downloaded, total, event.speed, event.eta)
                        .await
                        .map_err(|err| ExtractorError::Protocol(err.to_string()))?;

                    let delta = downloaded.saturating_sub(guard.last_bytes).max(0);
                    metrics.add_downloaded_bytes(u64::try_from(delta).unwrap_or(0));
                    guard.last_bytes = downloaded;
                    guard.last_flush = Instant::now();
                    Ok(())
                }
                _ => Ok(()),
            }
        })
    })
}

/// Resolve where a successful extraction's artifacts landed (spec
/// §4.3.2) and build the [`FinishOk`] payload for [`JobStore::finish_ok`].
fn build_finish_ok(root: &StorageRoot, info: &InfoDict) -> FinishOk {
    let resolved = vodkeep_fsops::resolve_artifacts(
        root,
        &info.requested_download_candidates(),
        &info.local_path_candidates(),
        info.id.as_deref(),
    );

    FinishOk {
        canonical_url: info.canonical_url.clone(),
        webpage_url: info.webpage_url.clone(),
        video_id: info.id.clone(),
        extractor: info.extractor.clone(),
        extractor_key: info.extractor_key.clone(),
        title: info.title.clone(),
        uploader: info.uploader.clone(),
        uploader_id: info.uploader_id.clone(),
        channel: info.channel.clone(),
        channel_id: info.channel_id.clone(),
        duration_seconds: info.duration,
        upload_date: info.upload_date.clone(),
        thumbnail_remote_url: info.thumbnail.clone(),
        media_local_path: resolved.media_path.map(|p| p.display().to_string()),
        media_ext: resolved.media_ext,
        thumbnail_local_path: resolved.thumbnail_path.map(|p| p.display().to_string()),
        metadata_json: Some(serialize_metadata(info)),
    }
}

/// Run one job to a terminal state or `paused` (spec §4.3). Never
/// escapes an error to the caller; every path either transitions the row
/// or returns having left it `paused`.
pub(crate) async fn run_job(job_id: String, cancel: CancelSignal, ctx: Arc<WorkerContext>) {
    let started_at = Instant::now();

    let job = match ctx.store.get(&job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return,
        Err(err) => {
            tracing::error!(job_id = %job_id, error = %err, "failed to read job at worker entry");
            return;
        }
    };
    if job.requested_url.is_empty() {
        return;
    }

    let plan = build_attempt_plan(&job.requested_url, ctx.youtube_fallback_enabled);
    let plan_len = plan.len();

    for step in plan {
        if cancel.is_set() {
            finish_paused(&ctx, &job, started_at, None).await;
            return;
        }

        let began = match ctx.store.begin(&job.id, step.attempt_no, i32::try_from(plan_len).unwrap_or(i32::MAX), step.profile).await {
            Ok(began) => began,
            Err(err) => {
                tracing::error!(job_id = %job.id, error = %err, "begin transition failed");
                return;
            }
        };
        if !began {
            if let Err(err) = ctx.store.get(&job.id).await {
                tracing::error!(job_id = %job.id, error = %err, "status check after failed begin failed");
            }
            return;
        }

        let attempt_id = match ctx.store.insert_attempt(&job.id, step.attempt_no, step.profile).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(job_id = %job.id, error = %err, "failed to record attempt");
                return;
            }
        };

        tracing::info!(
            job_id = %job.id,
            preset = %job.preset,
            attempt = step.attempt_no,
            runtime_profile = %step.profile,
            "job_started"
        );

        let options = build_extract_options(&ctx, job.preset, step.profile);
        let hook = build_progress_hook(
            ctx.store.clone(),
            ctx.metrics.clone(),
            job.id.clone(),
            cancel.clone(),
            ctx.flush_interval,
        );

        match ctx.extractor.extract(&job.requested_url, &options, hook).await {
            Ok(info) => {
                let finish = build_finish_ok(&ctx.root, &info);
                if let Err(err) = ctx.store.finish_ok(&job.id, &finish).await {
                    tracing::error!(job_id = %job.id, error = %err, "finish_ok failed");
                }
                if let Err(err) = ctx
                    .store
                    .finalize_attempt(attempt_id, AttemptStatus::Completed, None, None)
                    .await
                {
                    tracing::error!(job_id = %job.id, error = %err, "finalize_attempt failed");
                }
                ctx.metrics.job_completed();
                ctx.metrics.observe_job_duration(job.preset.id(), "completed", started_at.elapsed().as_secs_f64());
                tracing::info!(job_id = %job.id, preset = %job.preset, "job_completed");
                return;
            }
            Err(ExtractorError::PauseRequested) => {
                finish_paused(&ctx, &job, started_at, Some(attempt_id)).await;
                return;
            }
            Err(err) => {
                let (message, exception_type) = describe_extractor_error(&err);
                if let Err(store_err) = ctx
                    .store
                    .finalize_attempt(attempt_id, AttemptStatus::Failed, Some(&message), Some(&exception_type))
                    .await
                {
                    tracing::error!(job_id = %job.id, error = %store_err, "finalize_attempt failed");
                }

                if is_retryable(step.profile, step.attempt_no, plan_len, &message) {
                    ctx.metrics.job_retried();
                    tracing::info!(job_id = %job.id, attempt = step.attempt_no, "job_retried");
                    continue;
                }

                if let Err(store_err) = ctx
                    .store
                    .finish_fail(&job.id, &message, &exception_type, step.profile, step.attempt_no)
                    .await
                {
                    tracing::error!(job_id = %job.id, error = %store_err, "finish_fail failed");
                }
                let reason = classify_failure_reason(&message);
                ctx.metrics.job_failed(reason);
                ctx.metrics.observe_job_duration(job.preset.id(), "failed", started_at.elapsed().as_secs_f64());
                tracing::error!(job_id = %job.id, preset = %job.preset, reason, message = %message, "job_failed");
                return;
            }
        }
    }
}

fn describe_extractor_error(err: &ExtractorError) -> (String, String) {
    match err {
        ExtractorError::Failed { message, exception_type } => {
            (message.clone(), exception_type.clone())
        }
        ExtractorError::Protocol(message) => (message.clone(), "ExtractorProtocolError".to_string()),
        ExtractorError::Process(source) => (source.to_string(), "ExtractorProcessError".to_string()),
        ExtractorError::PauseRequested => {
            unreachable!("PauseRequested is handled by its own match arm")
        }
    }
}

async fn finish_paused(ctx: &WorkerContext, job: &Job, started_at: Instant, attempt_id: Option<i64>) {
    if let Err(err) = ctx.store.pause_force(&job.id).await {
        tracing::error!(job_id = %job.id, error = %err, "pause_force failed");
    }
    if let Some(attempt_id) = attempt_id {
        if let Err(err) = ctx
            .store
            .finalize_attempt(attempt_id, AttemptStatus::Paused, Some("paused_by_user"), Some("PauseRequestedError"))
            .await
        {
            tracing::error!(job_id = %job.id, error = %err, "finalize_attempt for pause failed");
        }
    }
    ctx.metrics.job_paused();
    ctx.metrics.observe_job_duration(job.preset.id(), "paused", started_at.elapsed().as_secs_f64());
    tracing::info!(job_id = %job.id, preset = %job.preset, "job_paused");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_plan_adds_fallback_only_for_youtube() {
        let plan = build_attempt_plan("https://www.youtube.com/watch?v=abc", true);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].profile, RuntimeProfile::Fallback);

        let plan = build_attempt_plan("https://example.com/video", true);
        assert_eq!(plan.len(), 1);

        let plan = build_attempt_plan("https://youtu.be/abc", true);
        assert_eq!(plan.len(), 2);

        let plan = build_attempt_plan("https://www.youtube.com/watch?v=abc", false);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn retryable_predicate_requires_primary_profile_and_remaining_attempts() {
        assert!(is_retryable(RuntimeProfile::Primary, 1, 2, "HTTP Error 403: Forbidden"));
        assert!(!is_retryable(RuntimeProfile::Fallback, 1, 2, "403 forbidden"));
        assert!(!is_retryable(RuntimeProfile::Primary, 2, 2, "403 forbidden"));
        assert!(!is_retryable(RuntimeProfile::Primary, 1, 2, "some other error"));
    }

    #[test]
    fn failure_reason_classification_matches_tokens() {
        assert_eq!(classify_failure_reason("HTTP Error 403: Forbidden"), "forbidden");
        assert_eq!(classify_failure_reason("network unreachable"), "network");
        assert_eq!(classify_failure_reason("video not available"), "unavailable");
        assert_eq!(classify_failure_reason("boom"), "other");
    }
}
