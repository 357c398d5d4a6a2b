//! `GET /files/<path>` (spec.md §6.2, testable property 5/6): serves
//! media, thumbnails, and sidecars, confined to the storage root.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::ApiState;

/// Serve a file under the storage root. Returns 403 if `path` escapes the
/// root, 404 if it resolves inside the root but does not exist.
pub(crate) async fn serve_file(
    State(state): State<Arc<ApiState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let Some(resolved) = state.storage_root.resolve(&path) else {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "path_escapes_root".to_string()));
    };

    let bytes = tokio::fs::read(&resolved)
        .await
        .map_err(|_| ApiError::not_found("not_found"))?;

    let content_type = content_type_for(&resolved);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(bytes),
    )
        .into_response())
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("mp4") => "video/mp4",
        Some("m4a") => "audio/mp4",
        Some("webm") => "video/webm",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
