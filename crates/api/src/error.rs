use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tickerlens_core::{DataError, ParsePeriodError};
use tickerlens_indicators::{AssemblyError, ParseConfigError};

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<AssemblyError> for ApiError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::NoData(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<ParseConfigError> for ApiError {
    fn from(err: ParseConfigError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ParsePeriodError> for ApiError {
    fn from(err: ParsePeriodError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "Upstream data failure");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
