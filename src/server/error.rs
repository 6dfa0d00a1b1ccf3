//! API error responses.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::api::ErrorBody;
use crate::config::BuildConfigError;
use crate::shell::ResolveError;

/// Errors that end an API request before any build output exists.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The build script or its interpreter could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The request body could not be understood.
    #[error("{0}")]
    InvalidRequestBody(String),

    /// The route exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// No such API route.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another build or bootstrap holds the run lock.
    #[error("A build is already running")]
    BuildInProgress,

    /// `build.config` could not be persisted.
    #[error("{0}")]
    ConfigWrite(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Resolve(_) | Self::ConfigWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BuildInProgress => StatusCode::CONFLICT,
        }
    }

    /// Stable machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolve(ResolveError::InterpreterNotFound { .. }) => "InterpreterNotFound",
            Self::Resolve(ResolveError::ScriptNotFound(_)) => "ScriptNotFound",
            Self::Resolve(ResolveError::ScriptNotExecutable(_)) => "ScriptNotExecutable",
            Self::InvalidRequestBody(_) => "InvalidRequestBody",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::NotFound(_) => "NotFound",
            Self::BuildInProgress => "BuildInProgress",
            Self::ConfigWrite(_) => "ConfigWrite",
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Resolve(e) => Some(e.hint()),
            Self::BuildInProgress => Some("Wait for the running build to finish"),
            _ => None,
        }
    }
}

impl From<BuildConfigError> for ApiError {
    fn from(err: BuildConfigError) -> Self {
        match err {
            BuildConfigError::InvalidJson(_) | BuildConfigError::InvalidValue { .. } => {
                Self::InvalidRequestBody(err.to_string())
            }
            BuildConfigError::Write { .. } => Self::ConfigWrite(err.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequestBody(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "Request rejected");
        }
        let body = ErrorBody {
            ok: false,
            error: self.to_string(),
            kind: self.kind(),
            hint: self.hint(),
        };
        (status, Json(body)).into_response()
    }
}
