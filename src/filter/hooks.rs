//! The before-auth / auth / error hook chain.
//!
//! # Responsibilities
//! - Hold the three user hooks, defaulting to no-ops and a re-raising error hook
//! - Run `before_auth` strictly before `auth`
//! - Turn panics and timeouts inside a hook into `Fail` signals
//!
//! # Design Decisions
//! - Hooks are async and awaited inside the request's task
//! - A hook that exceeds the configured timeout is dropped, never resumed
//! - Hooks are set once on the builder; the built set is immutable

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::filter::context::AuthRequest;
use crate::filter::signal::{AuthError, ControlSignal, FilterError, Payload};

/// `before_auth` / `auth` hook.
pub type AuthHook = Arc<dyn Fn(AuthRequest) -> BoxFuture<'static, ControlSignal> + Send + Sync>;

/// What the error hook decides: a payload to write, nothing, or a re-raised failure.
pub type ErrorOutcome = Result<Option<Payload>, AuthError>;

/// `on_error` hook.
pub type ErrorHook = Arc<dyn Fn(FilterError) -> BoxFuture<'static, ErrorOutcome> + Send + Sync>;

pub(crate) fn auth_hook<F, Fut>(f: F) -> AuthHook
where
    F: Fn(AuthRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ControlSignal> + Send + 'static,
{
    Arc::new(move |request| f(request).boxed())
}

pub(crate) fn error_hook<F, Fut>(f: F) -> ErrorHook
where
    F: Fn(FilterError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ErrorOutcome> + Send + 'static,
{
    Arc::new(move |err| f(err).boxed())
}

/// Default error hook: re-raise recognized failures, wrap the rest as `Generic`.
pub async fn default_error_handler(err: FilterError) -> ErrorOutcome {
    match err {
        FilterError::Auth(e) => Err(e),
        FilterError::Other(e) => Err(AuthError::Generic(e.to_string())),
    }
}

/// The three hooks of a filter.
#[derive(Clone)]
pub struct HookSet {
    pub(crate) before_auth: AuthHook,
    pub(crate) auth: AuthHook,
    pub(crate) on_error: ErrorHook,
}

impl Default for HookSet {
    fn default() -> Self {
        Self {
            before_auth: auth_hook(|_| async { ControlSignal::Continue }),
            auth: auth_hook(|_| async { ControlSignal::Continue }),
            on_error: error_hook(default_error_handler),
        }
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet").finish_non_exhaustive()
    }
}

impl HookSet {
    /// Run `before_auth` then `auth`.
    ///
    /// `Fail` or `Result` from `before_auth` skips `auth`; so does `Stop`.
    pub async fn run(&self, request: &AuthRequest, timeout: Option<Duration>) -> ControlSignal {
        let before = guarded("before_auth", (self.before_auth)(request.clone()), timeout).await;
        if !before.is_continue() {
            return before;
        }
        guarded("auth", (self.auth)(request.clone()), timeout).await
    }

    /// Hand a failure to `on_error`. Called at most once per request.
    pub async fn handle_error(&self, err: FilterError, timeout: Option<Duration>) -> ErrorOutcome {
        let call = AssertUnwindSafe((self.on_error)(err)).catch_unwind();
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(timeout = ?limit, "on_error hook timed out");
                    return Err(AuthError::cancelled());
                }
            },
            None => call.await,
        };

        outcome.unwrap_or_else(|_| {
            tracing::error!("on_error hook panicked");
            Err(AuthError::Generic("error hook panicked".to_string()))
        })
    }
}

async fn guarded(
    stage: &'static str,
    hook: BoxFuture<'static, ControlSignal>,
    timeout: Option<Duration>,
) -> ControlSignal {
    let call = AssertUnwindSafe(hook).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(stage, timeout = ?limit, "hook timed out, abandoning");
                return ControlSignal::fail(AuthError::cancelled());
            }
        },
        None => call.await,
    };

    outcome.unwrap_or_else(|_| {
        tracing::error!(stage, "hook panicked");
        ControlSignal::fail(FilterError::other(format!("{stage} hook panicked")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::context::RequestHead;
    use crate::handler::meta::HandlerMeta;
    use axum::http::{HeaderMap, Method};
    use std::sync::Mutex;

    fn request() -> AuthRequest {
        AuthRequest::new(
            RequestHead::new(Method::GET, "/admin", HeaderMap::new()),
            HandlerMeta::new("admin"),
        )
    }

    fn recording(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        signal: fn() -> ControlSignal,
    ) -> AuthHook {
        let log = log.clone();
        auth_hook(move |_| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name);
                signal()
            }
        })
    }

    #[tokio::test]
    async fn test_defaults_continue() {
        let hooks = HookSet::default();
        assert!(hooks.run(&request(), None).await.is_continue());
    }

    #[tokio::test]
    async fn test_before_auth_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = HookSet {
            before_auth: recording(&log, "before_auth", || ControlSignal::Continue),
            auth: recording(&log, "auth", || ControlSignal::Continue),
            ..HookSet::default()
        };

        assert!(hooks.run(&request(), None).await.is_continue());
        assert_eq!(*log.lock().unwrap(), vec!["before_auth", "auth"]);
    }

    #[tokio::test]
    async fn test_before_auth_failure_skips_auth() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hooks = HookSet {
            before_auth: recording(&log, "before_auth", || {
                ControlSignal::fail(AuthError::NotLoggedIn("no token".into()))
            }),
            auth: recording(&log, "auth", || ControlSignal::Continue),
            ..HookSet::default()
        };

        let signal = hooks.run(&request(), None).await;
        assert!(matches!(
            signal,
            ControlSignal::Fail(FilterError::Auth(AuthError::NotLoggedIn(_)))
        ));
        assert_eq!(*log.lock().unwrap(), vec!["before_auth"]);
    }

    #[tokio::test]
    async fn test_panicking_hook_fails() {
        let hooks = HookSet {
            auth: auth_hook(|_| async {
                if true {
                    panic!("boom");
                }
                ControlSignal::Continue
            }),
            ..HookSet::default()
        };

        let signal = hooks.run(&request(), None).await;
        assert!(matches!(signal, ControlSignal::Fail(FilterError::Other(_))));
    }

    #[tokio::test]
    async fn test_slow_hook_is_cancelled() {
        let hooks = HookSet {
            auth: auth_hook(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                ControlSignal::Continue
            }),
            ..HookSet::default()
        };

        let signal = hooks.run(&request(), Some(Duration::from_millis(20))).await;
        match signal {
            ControlSignal::Fail(FilterError::Auth(err)) => assert_eq!(err, AuthError::cancelled()),
            other => panic!("unexpected signal: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_error_hook_is_cancelled() {
        let hooks = HookSet {
            on_error: error_hook(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(None)
            }),
            ..HookSet::default()
        };

        let outcome = hooks
            .handle_error(FilterError::other("upstream"), Some(Duration::from_millis(20)))
            .await;
        assert_eq!(outcome, Err(AuthError::cancelled()));
    }

    #[tokio::test]
    async fn test_panicking_error_hook_becomes_generic() {
        let hooks = HookSet {
            on_error: error_hook(|_| async {
                if true {
                    panic!("boom");
                }
                Ok(None)
            }),
            ..HookSet::default()
        };

        for timeout in [None, Some(Duration::from_secs(1))] {
            let err = FilterError::from(AuthError::NotLoggedIn("no token".into()));
            let outcome = hooks.handle_error(err, timeout).await;
            assert_eq!(outcome, Err(AuthError::Generic("error hook panicked".into())));
        }
    }

    #[tokio::test]
    async fn test_default_error_handler() {
        let recognized = default_error_handler(AuthError::MissingRole("admin".into()).into()).await;
        assert_eq!(recognized, Err(AuthError::MissingRole("admin".into())));

        let wrapped = default_error_handler(FilterError::other("socket closed")).await;
        assert_eq!(wrapped, Err(AuthError::Generic("socket closed".into())));
    }
}
