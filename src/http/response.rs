//! Response rendering for filter outcomes.
//!
//! # Responsibilities
//! - Render short-circuit payloads
//! - Render re-raised `AuthError`s as the outer error layer
//!
//! # Design Decisions
//! - JSON error body: `{ "error": { "code", "message" } }`
//! - 401 for missing login, 403 for role/permission/disabled, 500 otherwise

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::filter::signal::{AuthError, AuthErrorKind, Payload, PayloadBody};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// HTTP status for a re-raised failure.
pub fn status_for(kind: AuthErrorKind) -> StatusCode {
    match kind {
        AuthErrorKind::NotLoggedIn => StatusCode::UNAUTHORIZED,
        AuthErrorKind::MissingRole | AuthErrorKind::MissingPermission | AuthErrorKind::Disabled => {
            StatusCode::FORBIDDEN
        }
        AuthErrorKind::Generic => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let body = ErrorResponse {
            error: ErrorBody {
                code: kind.to_string(),
                message: self.message().to_string(),
            },
        };

        (status_for(kind), Json(body)).into_response()
    }
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.body().clone() {
            PayloadBody::Text(text) => (status, text).into_response(),
            PayloadBody::Json(value) => (status, Json(value)).into_response(),
        }
    }
}
