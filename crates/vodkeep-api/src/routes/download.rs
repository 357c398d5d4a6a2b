//! `POST /download` (spec.md §6.2 scenario 1/2).

use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use vodkeep_api_models::EnqueueResponseDto;

use crate::error::ApiError;
use crate::state::ApiState;

/// Body of `POST /download`.
#[derive(Debug, Deserialize)]
pub(crate) struct DownloadForm {
    /// The URL to enqueue.
    u: String,
    /// The preset id, e.g. `best`.
    preset: String,
}

/// Enqueue a job. 202 with `{ok,job_id,preset,status}` on success, 400 on
/// an invalid URL or preset (mapped from [`ApiError`]).
pub(crate) async fn download(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<DownloadForm>,
) -> Result<Response, ApiError> {
    let job = state.control_plane.enqueue(&form.u, &form.preset).await?;
    let body = EnqueueResponseDto::from_job(&job);
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}
