//! HTTP-facing error type.
//!
//! Collaborator errors are converted here and nowhere else. Client and
//! upstream errors render as `{"detail": "..."}`. Panics are the only
//! unhandled path and render as `{"error": {"type": "...", "detail": "..."}}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::resolver::ResolveError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid API key")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{detail}")]
    InvalidBody { status: StatusCode, detail: String },

    #[error("No matching lab")]
    NoMatch,

    #[error("Failed to list tracks")]
    ListFailed(#[source] CatalogError),

    #[error("Invite creation failed: {0}")]
    InviteFailed(#[source] CatalogError),

    #[error("Lab directory unavailable")]
    DirectoryUnavailable(#[source] CatalogError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidBody { status, .. } => *status,
            Self::NoMatch => StatusCode::NOT_FOUND,
            Self::ListFailed(_) | Self::InviteFailed(_) | Self::DirectoryUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Directory(e) => AppError::DirectoryUnavailable(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

/// Body used for unhandled failures, including panics.
pub fn internal_error_response(kind: &str, detail: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": { "type": kind, "detail": detail } })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::ListFailed(e) | Self::InviteFailed(e) | Self::DirectoryUnavailable(e) => {
                tracing::error!(error = %e, "{}", self);
            }
            _ => {}
        }

        (
            self.status_code(),
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}
