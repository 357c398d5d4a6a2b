//! Maps [`ControlPlaneError`] onto an HTTP status and the literal
//! `{ok:false, error:"..."}` body spec.md §6.2/§8 names.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vodkeep_api_models::{ControlPlaneError, ErrorResponseDto};

/// An error ready to be turned into an HTTP response.
///
/// Named-constructor-plus-`IntoResponse` shape, kept the same as the
/// donor's `ApiError`, but the body is the spec's flat error token rather
/// than an RFC9457 problem document.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    token: String,
}

impl ApiError {
    pub(crate) const fn new(status: StatusCode, token: String) -> Self {
        Self { status, token }
    }

    pub(crate) fn bad_request(token: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, token.into())
    }

    pub(crate) fn not_found(token: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, token.into())
    }

    pub(crate) fn internal(token: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, token.into())
    }
}

impl From<ControlPlaneError> for ApiError {
    fn from(err: ControlPlaneError) -> Self {
        let status = match &err {
            ControlPlaneError::InvalidUrl | ControlPlaneError::InvalidPreset { .. } => {
                StatusCode::BAD_REQUEST
            }
            ControlPlaneError::NotFound { .. } => StatusCode::NOT_FOUND,
            ControlPlaneError::InvalidState { .. }
            | ControlPlaneError::JobNotActiveOrNotQueued { .. } => StatusCode::CONFLICT,
            ControlPlaneError::PathEscapesRoot => StatusCode::FORBIDDEN,
            ControlPlaneError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if matches!(err, ControlPlaneError::Internal(_)) {
            tracing::error!(error = %err, "control plane returned an internal error");
        }
        Self::new(status, err.token().to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponseDto::new(self.token))).into_response()
    }
}
