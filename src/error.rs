use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// ApiError
///
/// The single error type returned by every handler and by the Auth Gate.
/// Each variant maps to one HTTP status; the body is always `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: the first violated input rule.
    #[error("{0}")]
    Validation(String),
    /// 401: missing/invalid token or bad login credentials.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// 403: authenticated, but not the owner of the resource.
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    /// 400: unique constraint hit, e.g. a duplicate email.
    #[error("{0}")]
    Conflict(&'static str),
    /// 500: infrastructure failure. `source` is logged, never sent to the client.
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ApiError {
    pub fn internal(message: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { message, source } = &self {
            tracing::error!(error = ?source, "{message}");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(%rejection, "rejected request body");
        Self::Validation("Invalid request body".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(%rejection, "rejected path parameters");
        Self::Validation("Invalid ID in path".to_string())
    }
}

/// Converts infrastructure errors into [`ApiError::Internal`] at the call site.
pub trait ResultExt<T> {
    fn or_internal(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn or_internal(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::internal(message, e))
    }
}
