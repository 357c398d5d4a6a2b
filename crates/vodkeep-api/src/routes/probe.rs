//! `GET /api/probe?u=<url>` (§11): resolve a URL's title/extension without
//! enqueuing a download.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use vodkeep_api_models::ProbeResponseDto;

use crate::error::ApiError;
use crate::state::ApiState;

/// Query parameters accepted by `GET /api/probe`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProbeQuery {
    /// The URL to probe.
    u: String,
}

pub(crate) async fn probe(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ProbeQuery>,
) -> Result<Json<ProbeResponseDto>, ApiError> {
    let info = state.control_plane.probe(&query.u).await?;
    Ok(Json(info.into()))
}
