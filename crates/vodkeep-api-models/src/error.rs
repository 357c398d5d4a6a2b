//! The error type [`ControlPlane`](crate::ControlPlane) implementations
//! return. Every variant maps to one HTTP status in `vodkeep-api` and to
//! one of the literal error tokens spec.md §6.2/§8 names.

use thiserror::Error;

/// Failure outcome of a control-plane operation.
///
/// These are surfaced synchronously to the HTTP caller (spec.md §7,
/// "Validation errors at the control plane") and are never written to the
/// store.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The submitted URL did not begin with `http://` or `https://`.
    #[error("invalid_url")]
    InvalidUrl,

    /// The submitted preset id is outside the closed set (§6.1).
    #[error("invalid_preset")]
    InvalidPreset {
        /// The rejected preset id, as submitted.
        preset: String,
    },

    /// No job exists with the given id.
    #[error("not_found")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The requested transition's predicate did not hold for the job's
    /// current status (e.g. `retry` on a `queued` job).
    #[error("invalid_state")]
    InvalidState {
        /// The job the transition was attempted on.
        id: String,
    },

    /// `pause` was requested for a job that is neither `queued` nor held
    /// in the in-memory active map.
    #[error("job_not_active_or_not_queued")]
    JobNotActiveOrNotQueued {
        /// The job the pause was attempted on.
        id: String,
    },

    /// A relative path escaped the storage root, or otherwise failed
    /// containment validation.
    #[error("path_escapes_root")]
    PathEscapesRoot,

    /// The underlying store or filesystem failed unexpectedly.
    #[error("internal_error: {0}")]
    Internal(String),
}

impl ControlPlaneError {
    /// The stable token used in `{ok:false, error:"..."}` response bodies
    /// and in the `ProblemDetails` `kind` field.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::InvalidPreset { .. } => "invalid_preset",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::JobNotActiveOrNotQueued { .. } => "job_not_active_or_not_queued",
            Self::PathEscapesRoot => "path_escapes_root",
            Self::Internal(_) => "internal_error",
        }
    }
}
