//! Maps [`SupervisorError`] onto HTTP status codes exactly per spec §7's
//! taxonomy table, and shapes the `{success: false, error: {...}}` body
//! from spec §6.1.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pgw_supervisor::SupervisorError;
use serde::Serialize;
use serde_json::json;

/// The `error` object embedded in a failed `invoke` response (spec
/// §6.1).
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// The §7 taxonomy kind (`ProviderNotFound`, `TimeoutError`, ...).
    pub code: &'static str,
    /// Human-readable message, safe to show a caller.
    pub message: String,
}

/// Wraps a [`SupervisorError`] so it can be returned directly from an
/// `axum` handler and produces the correct status code + body shape.
pub struct ApiError(pub SupervisorError);

impl From<SupervisorError> for ApiError {
    fn from(err: SupervisorError) -> Self {
        Self(err)
    }
}

/// Status code for each §7 taxonomy kind. `ConnectFailed`/`CatalogueFailed`
/// are startup-time errors (spec §7: "aborts initialization") and are
/// never returned from a live dispatch path, but are mapped defensively
/// rather than left to panic if one ever surfaces here.
fn status_for(err: &SupervisorError) -> StatusCode {
    match err {
        SupervisorError::ProviderNotFound(_) | SupervisorError::ToolNotFound { .. } => StatusCode::NOT_FOUND,
        SupervisorError::ProviderNotRunning(_) => StatusCode::SERVICE_UNAVAILABLE,
        SupervisorError::ProviderCrashed(_) => StatusCode::BAD_GATEWAY,
        SupervisorError::TimeoutError { .. } => StatusCode::REQUEST_TIMEOUT,
        SupervisorError::ToolExecutionError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SupervisorError::ConnectFailed { .. } | SupervisorError::CatalogueFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SupervisorError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({
            "success": false,
            "error": ErrorBody {
                code: self.0.kind(),
                message: self.0.to_string(),
            },
        }));
        (status, body).into_response()
    }
}
