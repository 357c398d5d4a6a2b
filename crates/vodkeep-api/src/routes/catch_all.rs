//! `GET /<raw>` catch-all (spec.md §6.2): legacy clients sometimes request
//! a URL directly as the path, with the scheme's second slash collapsed by
//! an intermediate proxy (`http:/example.com` instead of `http://`).

use std::sync::Arc;

use axum::Json;
use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vodkeep_api_models::{EnqueueResponseDto, ErrorResponseDto};

use crate::error::ApiError;
use crate::state::ApiState;

/// Default preset used when a bare URL lands in the catch-all path.
const CATCH_ALL_PRESET: &str = "best";

pub(crate) async fn catch_all(
    State(state): State<Arc<ApiState>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let Some(url) = reconstruct_url(uri.path(), uri.query()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponseDto::new("invalid_url")),
        )
            .into_response();
    };

    match state.control_plane.enqueue(&url, CATCH_ALL_PRESET).await {
        Ok(job) => (StatusCode::ACCEPTED, Json(EnqueueResponseDto::from_job(&job))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Repair a single collapsed scheme slash and re-attach the query string,
/// returning `None` unless the result is a well-formed `http(s)://` URL.
fn reconstruct_url(path: &str, query: Option<&str>) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    let repaired = if let Some(rest) = trimmed.strip_prefix("https:/").filter(|_| !trimmed.starts_with("https://")) {
        format!("https://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http:/").filter(|_| !trimmed.starts_with("http://")) {
        format!("http://{rest}")
    } else {
        trimmed.to_string()
    };

    if !(repaired.starts_with("http://") || repaired.starts_with("https://")) {
        return None;
    }

    match query {
        Some(q) if !q.is_empty() => Some(format!("{repaired}?{q}")),
        _ => Some(repaired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_a_single_collapsed_slash() {
        assert_eq!(
            reconstruct_url("/http:/youtube.com/watch", Some("v=abc123")),
            Some("http://youtube.com/watch?v=abc123".to_string())
        );
    }

    #[test]
    fn leaves_a_well_formed_scheme_untouched() {
        assert_eq!(
            reconstruct_url("/https://youtube.com/watch", Some("v=abc123")),
            Some("https://youtube.com/watch?v=abc123".to_string())
        );
    }

    #[test]
    fn rejects_non_url_paths() {
        assert_eq!(reconstruct_url("/favicon.ico", None), None);
    }

    #[test]
    fn omits_empty_query_string() {
        assert_eq!(
            reconstruct_url("/http:/example.com/video", Some("")),
            Some("http://example.com/video".to_string())
        );
    }
}
