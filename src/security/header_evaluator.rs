//! Header-driven marker evaluator.

use async_trait::async_trait;

use crate::filter::context::AuthRequest;
use crate::filter::gate::MarkerEvaluator;
use crate::filter::signal::{AuthError, FilterError};
use crate::handler::meta::{MatchMode, Marker};

pub const ROLES_HEADER: &str = "x-roles";
pub const PERMISSIONS_HEADER: &str = "x-permissions";
pub const DISABLED_HEADER: &str = "x-disabled";

/// Evaluates markers against identity headers set by an upstream proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderMarkerEvaluator;

impl HeaderMarkerEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn check_login(request: &AuthRequest) -> Result<(), AuthError> {
        let token = request
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .unwrap_or_default();

        if token.is_empty() {
            return Err(AuthError::NotLoggedIn("missing bearer token".to_string()));
        }
        Ok(())
    }
}

fn header_list<'a>(request: &'a AuthRequest, name: &str) -> Vec<&'a str> {
    request
        .header(name)
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// `user:*` grants `user:delete`; `*` grants everything.
///
/// A wildcard only stands for whole `:` segments, so `user*` is a plain
/// literal and never grants `username:delete`.
fn grants(granted: &str, required: &str) -> bool {
    if granted == "*" {
        return true;
    }
    match granted.strip_suffix(":*") {
        Some(scope) => required
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with(':')),
        None => granted == required,
    }
}

/// The first required value not granted, if the requirement fails.
fn missing<'r>(granted: &[&str], required: &'r [String], mode: MatchMode) -> Option<&'r str> {
    let held = |r: &String| granted.iter().any(|g| grants(g, r));
    match mode {
        MatchMode::And => required.iter().find(|&r| !held(r)).map(String::as_str),
        MatchMode::Or if required.is_empty() || required.iter().any(|r| held(r)) => None,
        MatchMode::Or => Some(required[0].as_str()),
    }
}

#[async_trait]
impl MarkerEvaluator for HeaderMarkerEvaluator {
    async fn evaluate(&self, marker: &Marker, request: &AuthRequest) -> Result<(), FilterError> {
        match marker {
            Marker::Ignore => Ok(()),
            Marker::CheckLogin => Ok(Self::check_login(request)?),
            Marker::CheckRole { roles, mode } => {
                Self::check_login(request)?;
                match missing(&header_list(request, ROLES_HEADER), roles, *mode) {
                    Some(role) => Err(AuthError::MissingRole(role.to_string()).into()),
                    None => Ok(()),
                }
            }
            Marker::CheckPermission { permissions, mode } => {
                Self::check_login(request)?;
                match missing(&header_list(request, PERMISSIONS_HEADER), permissions, *mode) {
                    Some(permission) => {
                        Err(AuthError::MissingPermission(permission.to_string()).into())
                    }
                    None => Ok(()),
                }
            }
            Marker::CheckDisable { service } => {
                let disabled = header_list(request, DISABLED_HEADER);
                if disabled.iter().any(|s| *s == "*" || *s == service.as_str()) {
                    return Err(AuthError::Disabled(service.clone()).into());
                }
                Ok(())
            }
            Marker::Custom(name) => {
                Err(AuthError::Generic(format!("unsupported marker `{}`", name)).into())
            }
        }
    }
}
