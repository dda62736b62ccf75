//! Control signals and authorization failures.

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

/// Discriminant of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    NotLoggedIn,
    MissingRole,
    MissingPermission,
    Disabled,
    Generic,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            AuthErrorKind::NotLoggedIn => "NOT_LOGGED_IN",
            AuthErrorKind::MissingRole => "MISSING_ROLE",
            AuthErrorKind::MissingPermission => "MISSING_PERMISSION",
            AuthErrorKind::Disabled => "ACCOUNT_DISABLED",
            AuthErrorKind::Generic => "AUTH_FAILED",
        };
        f.write_str(code)
    }
}

/// A recognized authorization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No valid login for the request.
    #[error("not logged in: {0}")]
    NotLoggedIn(String),

    #[error("missing role: {0}")]
    MissingRole(String),

    #[error("missing permission: {0}")]
    MissingPermission(String),

    /// The account (or the account for a service) is disabled.
    #[error("account disabled: {0}")]
    Disabled(String),

    /// Any other failure, including wrapped unrecognized errors.
    #[error("authorization failed: {0}")]
    Generic(String),
}

impl AuthError {
    /// The failure reported when a hook is abandoned before completing.
    pub fn cancelled() -> Self {
        Self::Generic("cancelled".to_string())
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::NotLoggedIn(_) => AuthErrorKind::NotLoggedIn,
            AuthError::MissingRole(_) => AuthErrorKind::MissingRole,
            AuthError::MissingPermission(_) => AuthErrorKind::MissingPermission,
            AuthError::Disabled(_) => AuthErrorKind::Disabled,
            AuthError::Generic(_) => AuthErrorKind::Generic,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::NotLoggedIn(m)
            | AuthError::MissingRole(m)
            | AuthError::MissingPermission(m)
            | AuthError::Disabled(m)
            | AuthError::Generic(m) => m,
        }
    }
}

/// The cause carried by a `Fail` signal.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A failure outside the authorization taxonomy.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl FilterError {
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }

    /// The recognized failure, if any.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            FilterError::Auth(e) => Some(e),
            FilterError::Other(_) => None,
        }
    }
}

/// Body of a short-circuit response.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadBody {
    Text(String),
    Json(serde_json::Value),
}

/// A response written by the filter instead of running the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    status: StatusCode,
    body: PayloadBody,
}

impl Payload {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: PayloadBody::Text(body.into()),
        }
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: PayloadBody::Json(body),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &PayloadBody {
        &self.body
    }
}

impl From<&str> for Payload {
    fn from(body: &str) -> Self {
        Self::text(body)
    }
}

impl From<String> for Payload {
    fn from(body: String) -> Self {
        Self::text(body)
    }
}

/// Outcome of route matching, marker checks and hooks.
#[derive(Debug)]
pub enum ControlSignal {
    /// Keep going.
    Continue,
    /// Silently end checking; the request proceeds as if unfiltered.
    Stop,
    /// Short-circuit with a response.
    Result(Payload),
    Fail(FilterError),
}

impl ControlSignal {
    pub fn fail(err: impl Into<FilterError>) -> Self {
        Self::Fail(err.into())
    }

    pub fn result(payload: impl Into<Payload>) -> Self {
        Self::Result(payload.into())
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, ControlSignal::Continue)
    }
}

impl From<Result<(), AuthError>> for ControlSignal {
    fn from(result: Result<(), AuthError>) -> Self {
        match result {
            Ok(()) => ControlSignal::Continue,
            Err(e) => ControlSignal::fail(e),
        }
    }
}
