use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pathrace::RoundError;
use pathrace_core::Error;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failure of a request, rendered as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("Request timed out")]
    Timeout,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::UnknownNode(_)
            | Error::InvalidNodeIndex
            | Error::InvalidEdge { .. }
            | Error::GraphIntegrity(_)
            | Error::InvalidData(_)
            | Error::InvalidConfig(_) => ApiError::BadRequest(error.to_string()),
            Error::StepBudgetExceeded(_) | Error::OutsideSearchArea | Error::NoPointsFound => {
                ApiError::Unprocessable(error.to_string())
            }
            Error::GeoJsonError(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<RoundError> for ApiError {
    fn from(error: RoundError) -> Self {
        match error {
            RoundError::Core(e) => e.into(),
            RoundError::Aborted { .. } => ApiError::Timeout,
            other => ApiError::Unprocessable(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {self}");
        } else {
            warn!("Request rejected ({status}): {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
