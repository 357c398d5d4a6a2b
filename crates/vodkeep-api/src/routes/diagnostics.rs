//! `GET /api/diagnostics` (§11): resolved extractor runtime diagnostics.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use vodkeep_api_models::DiagnosticsResponseDto;

use crate::state::ApiState;

pub(crate) async fn diagnostics(State(state): State<Arc<ApiState>>) -> Json<DiagnosticsResponseDto> {
    Json(state.control_plane.diagnostics().await.into())
}
