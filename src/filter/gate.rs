//! Marker-driven bypass and mandatory checks.
//!
//! # Responsibilities
//! - Decide whether a handler opts out of authorization (`Marker::Ignore`)
//! - Evaluate the remaining markers in order, stopping at the first failure
//!
//! # Design Decisions
//! - Presence of `Ignore` on the method or its declaring type is sufficient
//! - Marker semantics live behind `MarkerEvaluator`; the gate only sequences
//! - Disabled gate: no bypass and no marker checks

use std::sync::Arc;

use async_trait::async_trait;

use crate::filter::context::AuthRequest;
use crate::filter::signal::{AuthError, ControlSignal, FilterError};
use crate::handler::meta::{HandlerMeta, Marker, MarkerKind};

/// Evaluates a single authorization marker for a request.
#[async_trait]
pub trait MarkerEvaluator: Send + Sync {
    async fn evaluate(&self, marker: &Marker, request: &AuthRequest) -> Result<(), FilterError>;
}

/// Fails every marker. Used until an evaluator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredEvaluator;

#[async_trait]
impl MarkerEvaluator for UnconfiguredEvaluator {
    async fn evaluate(&self, marker: &Marker, _request: &AuthRequest) -> Result<(), FilterError> {
        Err(AuthError::Generic(format!(
            "no marker evaluator configured for {}",
            marker.kind()
        ))
        .into())
    }
}

/// Bypass and mandatory-marker checks.
#[derive(Clone)]
pub struct AnnotationGate {
    enabled: bool,
    evaluator: Arc<dyn MarkerEvaluator>,
}

impl AnnotationGate {
    pub fn new(enabled: bool, evaluator: Arc<dyn MarkerEvaluator>) -> Self {
        Self { enabled, evaluator }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True if the handler opts out of all checks.
    pub fn should_bypass(&self, handler: &HandlerMeta) -> bool {
        self.enabled && handler.has_marker(MarkerKind::Ignore)
    }

    /// Evaluate every non-bypass marker in declaration order, fail-fast.
    pub async fn check_mandatory_markers(&self, request: &AuthRequest) -> ControlSignal {
        if !self.enabled {
            return ControlSignal::Continue;
        }

        for marker in request.handler().markers() {
            if marker.kind() == MarkerKind::Ignore {
                continue;
            }
            if let Err(err) = self.evaluator.evaluate(marker, request).await {
                tracing::debug!(
                    handler = %request.handler(),
                    marker = %marker.kind(),
                    error = %err,
                    "marker check failed"
                );
                return ControlSignal::Fail(err);
            }
        }
        ControlSignal::Continue
    }
}

impl Default for AnnotationGate {
    fn default() -> Self {
        Self::new(true, Arc::new(UnconfiguredEvaluator))
    }
}

impl std::fmt::Debug for AnnotationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationGate")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::context::RequestHead;
    use axum::http::{HeaderMap, Method};
    use std::sync::Mutex;

    /// Passes everything except `CheckRole`, recording what it saw.
    #[derive(Default)]
    struct RejectRoles {
        seen: Mutex<Vec<MarkerKind>>,
    }

    #[async_trait]
    impl MarkerEvaluator for RejectRoles {
        async fn evaluate(&self, marker: &Marker, _request: &AuthRequest) -> Result<(), FilterError> {
            self.seen.lock().unwrap().push(marker.kind());
            match marker {
                Marker::CheckRole { roles, .. } => {
                    Err(AuthError::MissingRole(roles.join(",")).into())
                }
                _ => Ok(()),
            }
        }
    }

    fn request(handler: HandlerMeta) -> AuthRequest {
        AuthRequest::new(RequestHead::new(Method::GET, "/x", HeaderMap::new()), handler)
    }

    #[test]
    fn test_bypass() {
        let gate = AnnotationGate::default();
        let ignored = HandlerMeta::new("login").with_type_marker(Marker::Ignore);
        assert!(gate.should_bypass(&ignored));
        assert!(!gate.should_bypass(&HandlerMeta::new("admin")));

        let disabled = AnnotationGate::new(false, Arc::new(UnconfiguredEvaluator));
        assert!(!disabled.should_bypass(&ignored));
    }

    #[tokio::test]
    async fn test_fail_fast_in_order() {
        let evaluator = Arc::new(RejectRoles::default());
        let gate = AnnotationGate::new(true, evaluator.clone());
        let handler = HandlerMeta::new("delete")
            .with_type_marker(Marker::CheckLogin)
            .with_marker(Marker::role("admin"))
            .with_marker(Marker::permission("user:delete"));

        let signal = gate.check_mandatory_markers(&request(handler)).await;
        assert!(matches!(
            signal,
            ControlSignal::Fail(FilterError::Auth(AuthError::MissingRole(_)))
        ));
        assert_eq!(
            *evaluator.seen.lock().unwrap(),
            vec![MarkerKind::CheckLogin, MarkerKind::CheckRole]
        );
    }

    #[tokio::test]
    async fn test_all_pass_continues() {
        let gate = AnnotationGate::new(true, Arc::new(RejectRoles::default()));
        let handler = HandlerMeta::new("list").with_marker(Marker::CheckLogin);
        assert!(gate.check_mandatory_markers(&request(handler)).await.is_continue());
    }

    #[tokio::test]
    async fn test_unconfigured_evaluator_fails_closed() {
        let gate = AnnotationGate::default();
        let handler = HandlerMeta::new("list").with_marker(Marker::CheckLogin);
        assert!(matches!(
            gate.check_mandatory_markers(&request(handler)).await,
            ControlSignal::Fail(_)
        ));
        assert!(gate
            .check_mandatory_markers(&request(HandlerMeta::new("open")))
            .await
            .is_continue());
    }
}
