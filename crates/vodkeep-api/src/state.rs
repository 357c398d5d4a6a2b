//! Shared state threaded through every handler via [`axum::extract::State`].

use std::sync::Arc;

use vodkeep_api_models::ControlPlane;
use vodkeep_fsops::StorageRoot;
use vodkeep_telemetry::Metrics;

/// Dependencies every route handler needs: the control-plane seam into
/// `vodkeep-app`, the metrics registry, and just enough of the storage
/// layout to serve files and answer `GET /readyz`.
pub(crate) struct ApiState {
    pub(crate) control_plane: Arc<dyn ControlPlane>,
    pub(crate) metrics: Metrics,
    pub(crate) min_free_disk_mb: u64,
    pub(crate) storage_root: StorageRoot,
}
