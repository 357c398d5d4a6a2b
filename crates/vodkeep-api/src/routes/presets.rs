//! `GET /api/presets` (spec.md §6.1/§6.2): the closed set of presets.

use axum::Json;
use vodkeep_api_models::PresetDto;
use vodkeep_domain::all_presets;

/// List every preset the enqueue path accepts.
pub(crate) async fn presets() -> Json<Vec<PresetDto>> {
    Json(all_presets().into_iter().map(PresetDto::from).collect())
}
