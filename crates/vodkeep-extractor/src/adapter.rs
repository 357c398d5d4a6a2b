//! The extractor adapter contract (spec §4.6): a single `extract` call
//! driven by a progress hook, plus the probe operation supplemented in §11.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ExtractorError;
use crate::types::{ExtractOptions, InfoDict, ProbeInfo, ProgressEvent};

/// The future a [`ProgressHook`] invocation returns.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), ExtractorError>> + Send>>;

/// Callback invoked by the adapter at least once per meaningful progress
/// step and once with `status = finished` on success. Returning
/// [`ExtractorError::PauseRequested`] tells the adapter to unwind
/// cooperatively.
pub type ProgressHook = Arc<dyn Fn(ProgressEvent) -> HookFuture + Send + Sync>;

/// External video-extraction engine, treated as an opaque dependency
/// (spec §4.6). Implementations shell out to, or embed, the actual
/// extraction tool; this crate only defines and drives the contract.
#[async_trait]
pub trait ExtractorAdapter: Send + Sync {
    /// Extract `url` under `options`, invoking `hook` with progress
    /// updates. Returns the resolved info dict (a playlist's first entry,
    /// if the URL is a playlist) on success.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::PauseRequested`] if the hook aborted the
    /// extraction, or [`ExtractorError::Failed`]/[`ExtractorError::Process`]
    /// on any other failure.
    async fn extract(
        &self,
        url: &str,
        options: &ExtractOptions,
        hook: ProgressHook,
    ) -> Result<InfoDict, ExtractorError>;

    /// Resolve lightweight metadata for `url` without downloading
    /// anything (spec §11).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Failed`]/[`ExtractorError::Process`] if
    /// the URL cannot be resolved.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, ExtractorError>;
}
