//! `GET /api/status/<id>`, `GET /api/jobs`, `GET /gallery`,
//! `POST /api/jobs/<id>/{pause,resume,retry}`, `DELETE /api/jobs/<id>`, and
//! the legacy `POST /delete` path (spec.md §6.2).

use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use vodkeep_domain::{JobListQuery, JobStatus};
use vodkeep_api_models::{JobListQueryDto, JobListResponseDto, JobResponseDto, parse_sort};

use crate::error::ApiError;
use crate::state::ApiState;

/// `GET /api/jobs`'s default page size (spec.md §6.2).
const DEFAULT_PER_PAGE: u32 = 20;
/// `GET /gallery`'s default page size (spec.md §6.2).
const GALLERY_DEFAULT_PER_PAGE: u32 = 24;
const MIN_PAGE: u32 = 1;
const MAX_PAGE: u32 = 100_000;
const MIN_PER_PAGE: u32 = 1;
const MAX_PER_PAGE: u32 = 100;

/// Parse a wire status id, matching [`vodkeep_domain::JobStatus`]'s
/// `snake_case` serde form. Unrecognised ids are treated as "no filter"
/// rather than a hard error, the same leniency [`parse_sort`] applies to
/// unknown sort ids.
fn parse_status(id: Option<&str>) -> Option<JobStatus> {
    match id {
        Some("queued") => Some(JobStatus::Queued),
        Some("downloading") => Some(JobStatus::Downloading),
        Some("retrying") => Some(JobStatus::Retrying),
        Some("paused") => Some(JobStatus::Paused),
        Some("completed") => Some(JobStatus::Completed),
        Some("failed") => Some(JobStatus::Failed),
        _ => None,
    }
}

fn to_domain_query(dto: JobListQueryDto, default_per_page: u32) -> JobListQuery {
    let page = dto.page.unwrap_or(MIN_PAGE).clamp(MIN_PAGE, MAX_PAGE);
    let per_page = dto
        .per_page
        .unwrap_or(default_per_page)
        .clamp(MIN_PER_PAGE, MAX_PER_PAGE);
    JobListQuery {
        page,
        per_page,
        status: parse_status(dto.status.as_deref()),
        q: dto.q,
        sort: parse_sort(dto.sort.as_deref()),
        uploader: dto.uploader,
    }
}

/// `GET /api/status/<id>`: 200 `{ok, job}` or 404.
pub(crate) async fn status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponseDto>, ApiError> {
    let job = state.control_plane.get(&id).await?;
    Ok(Json(job.into()))
}

/// `GET /api/jobs?page&per_page&status&q&sort&uploader`: paginated list.
pub(crate) async fn list(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<JobListQueryDto>,
) -> Result<Json<JobListResponseDto>, ApiError> {
    let requested_page = query.page.unwrap_or(MIN_PAGE).clamp(MIN_PAGE, MAX_PAGE);
    let requested_per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(MIN_PER_PAGE, MAX_PER_PAGE);
    let domain_query = to_domain_query(query, DEFAULT_PER_PAGE);
    let page = state.control_plane.list(domain_query).await?;
    Ok(Json(JobListResponseDto::new(page, requested_page, requested_per_page)))
}

/// `GET /gallery?sort&per_page&page`: the same listing, defaulting to a
/// 24-item page (spec.md §6.2, testable property 6).
pub(crate) async fn gallery(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<JobListQueryDto>,
) -> Result<Json<JobListResponseDto>, ApiError> {
    let requested_page = query.page.unwrap_or(MIN_PAGE).clamp(MIN_PAGE, MAX_PAGE);
    let requested_per_page = query
        .per_page
        .unwrap_or(GALLERY_DEFAULT_PER_PAGE)
        .clamp(MIN_PER_PAGE, MAX_PER_PAGE);
    let domain_query = to_domain_query(query, GALLERY_DEFAULT_PER_PAGE);
    let page = state.control_plane.list(domain_query).await?;
    Ok(Json(JobListResponseDto::new(page, requested_page, requested_per_page)))
}

/// `POST /api/jobs/<id>/pause`: 200 on state change, 409 if neither queued
/// nor active, 404 if unknown.
pub(crate) async fn pause(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponseDto>, ApiError> {
    let job = state.control_plane.pause(&id).await?;
    Ok(Json(job.into()))
}

/// `POST /api/jobs/<id>/resume`: 200 on state change, 409 on invalid
/// state, 404 if unknown.
pub(crate) async fn resume(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponseDto>, ApiError> {
    let job = state.control_plane.resume(&id).await?;
    Ok(Json(job.into()))
}

/// `POST /api/jobs/<id>/retry`: 200 on state change, 409 on invalid state,
/// 404 if unknown.
pub(crate) async fn retry(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponseDto>, ApiError> {
    let job = state.control_plane.retry(&id).await?;
    Ok(Json(job.into()))
}

/// `DELETE /api/jobs/<id>`: 200 on delete, 404 if unknown.
pub(crate) async fn delete_job(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponseDto>, ApiError> {
    let job = state.control_plane.delete(&id).await?;
    Ok(Json(job.into()))
}

/// Body of the legacy `POST /delete` path.
#[derive(Debug, Deserialize)]
pub(crate) struct LegacyDeleteForm {
    /// Delete by job id.
    job_id: Option<String>,
    /// Delete by media/thumbnail filename. Must not contain `/`, `\`, or
    /// `..` (spec.md §6.2, testable property 5).
    filename: Option<String>,
}

/// `POST /delete` (form: `job_id` or `filename`): legacy path kept for
/// callers that only know a downloaded filename, not a job id.
pub(crate) async fn legacy_delete(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<LegacyDeleteForm>,
) -> Result<Json<JobResponseDto>, ApiError> {
    if let Some(job_id) = form.job_id {
        let job = state.control_plane.delete(&job_id).await?;
        return Ok(Json(job.into()));
    }

    let filename = form
        .filename
        .ok_or_else(|| ApiError::bad_request("invalid_url"))?;
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(vodkeep_api_models::ControlPlaneError::PathEscapesRoot.into());
    }

    let job = state.control_plane.get_by_filename(&filename).await?;
    let deleted = state.control_plane.delete(&job.id).await?;
    Ok(Json(deleted.into()))
}
