//! Route handlers, one module per area of the HTTP surface (spec.md §6.2).

mod catch_all;
mod diagnostics;
mod download;
mod files;
mod health;
mod jobs;
mod presets;
mod probe;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::ApiState;

/// Build the full, unauthenticated router. Spec.md draws no auth boundary
/// around this surface (§1.3 non-goals); every route is public.
pub(crate) fn build(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/download", post(download::download))
        .route("/delete", post(jobs::legacy_delete))
        .route("/gallery", get(jobs::gallery))
        .route("/api/status/{id}", get(jobs::status))
        .route("/api/jobs", get(jobs::list))
        .route(
            "/api/jobs/{id}",
            delete(jobs::delete_job),
        )
        .route("/api/jobs/{id}/pause", post(jobs::pause))
        .route("/api/jobs/{id}/resume", post(jobs::resume))
        .route("/api/jobs/{id}/retry", post(jobs::retry))
        .route("/api/presets", get(presets::presets))
        .route("/api/probe", get(probe::probe))
        .route("/api/diagnostics", get(diagnostics::diagnostics))
        .route("/files/{*path}", get(files::serve_file))
        .route("/metrics", get(health::metrics))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .fallback(get(catch_all::catch_all))
        .with_state(state)
}
