//! `GET /healthz`, `GET /readyz`, and `GET /metrics` (spec.md §6.2/§6.5).

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use systemstat::{Platform, System};
use vodkeep_api_models::{HealthzResponseDto, ReadyzCheckDto, ReadyzResponseDto};

use crate::error::ApiError;
use crate::state::ApiState;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Always `{ok:true}`, 200 (spec.md §6.2).
pub(crate) async fn healthz() -> Json<HealthzResponseDto> {
    Json(HealthzResponseDto::default())
}

/// 200 if the database is read-write, the storage root is writable, and
/// free disk space is at least `MIN_FREE_DISK_MB`; 503 with per-check
/// diagnostics otherwise.
pub(crate) async fn readyz(State(state): State<Arc<ApiState>>) -> Response {
    let database = match state.control_plane.check_store_read_write().await {
        Ok(()) => ReadyzCheckDto::pass(),
        Err(err) => ReadyzCheckDto::fail(err.to_string()),
    };

    let storage_writable = check_storage_writable(&state);
    let free_disk_space = check_free_disk_space(&state);

    let mut body = ReadyzResponseDto {
        ok: false,
        database,
        storage_writable,
        free_disk_space,
    };
    body.ok = body.all_ok();
    let status = if body.ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body)).into_response()
}

fn check_storage_writable(state: &ApiState) -> ReadyzCheckDto {
    let probe_path = state.storage_root.path().join(".vodkeep-readyz-probe");
    match std::fs::write(&probe_path, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe_path);
            ReadyzCheckDto::pass()
        }
        Err(err) => ReadyzCheckDto::fail(err.to_string()),
    }
}

fn check_free_disk_space(state: &ApiState) -> ReadyzCheckDto {
    let system = System::new();
    match system.mount_at(state.storage_root.path()) {
        Ok(mount) => {
            let free_mb = mount.avail.0 / BYTES_PER_MB;
            if free_mb >= state.min_free_disk_mb {
                ReadyzCheckDto::pass()
            } else {
                ReadyzCheckDto::fail(format!(
                    "{free_mb} MB free, need {}",
                    state.min_free_disk_mb
                ))
            }
        }
        Err(err) => ReadyzCheckDto::fail(err.to_string()),
    }
}

/// Render the Prometheus registry (spec.md §6.5).
pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|err| ApiError::internal(format!("internal_error: {err}")))?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}
