//! The per-request authorization filter.
//!
//! # Data Flow
//! ```text
//! RequestHead
//!     → ResolveHandler  (HandlerResolver)        none     → Proceed
//!     → CheckBypass     (AnnotationGate)         bypass   → Proceed
//!     → CheckExclusion  (RouteRules snapshot)    excluded → Proceed
//!     → RunHooks        (markers, before_auth, auth)
//!     → Resolved        Continue/Stop → Proceed
//!                       Result(p)     → Respond(p)
//!                       Fail(e)       → on_error(e) → Respond / Handled / Propagate
//! ```
//!
//! # Design Decisions
//! - One immutable `AuthFilter` shared across requests via Arc
//! - Route lists live in an `ArcSwap` so a reload swaps a whole snapshot
//! - `on_error` runs exactly once per failed request, never for `Result`
//! - The filter writes at most one payload per request

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::config::schema::AuthConfig;
use crate::filter::context::{AuthRequest, RequestHead};
use crate::filter::gate::{AnnotationGate, MarkerEvaluator, UnconfiguredEvaluator};
use crate::filter::hooks::{auth_hook, error_hook, ErrorOutcome, HookSet};
use crate::filter::signal::{AuthError, ControlSignal, FilterError, Payload};
use crate::handler::registry::{HandlerRegistry, HandlerResolver};
use crate::routing::list::{RouteList, RouteRules};
use crate::routing::matcher::{PatternError, RoutePattern};

/// Final decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Run the downstream chain untouched.
    Proceed,
    /// Write this payload; do not run the chain.
    Respond(Payload),
    /// Handled by `on_error` without a payload; do not run the chain.
    Handled,
    /// `on_error` re-raised; the host's outer error layer takes over.
    Propagate(AuthError),
}

/// Where the filter writes its response.
pub trait ResponseSink {
    fn write_response(&mut self, payload: Payload);
    fn mark_handled(&mut self);
}

/// The rest of the host's processing chain.
#[async_trait]
pub trait FilterChain: Send {
    async fn proceed(self);
}

/// Builder for [`AuthFilter`]. All configuration happens here, before traffic.
pub struct AuthFilterBuilder {
    include: RouteList,
    exclude: RouteList,
    hooks: HookSet,
    annotation: bool,
    evaluator: Arc<dyn MarkerEvaluator>,
    resolver: Arc<dyn HandlerResolver>,
    hook_timeout: Option<Duration>,
}

impl Default for AuthFilterBuilder {
    fn default() -> Self {
        Self {
            include: RouteList::new(),
            exclude: RouteList::new(),
            hooks: HookSet::default(),
            annotation: true,
            evaluator: Arc::new(UnconfiguredEvaluator),
            resolver: Arc::new(HandlerRegistry::new()),
            hook_timeout: None,
        }
    }
}

impl AuthFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the `[auth]` section of a config file.
    pub fn from_config(config: &AuthConfig) -> Result<Self, PatternError> {
        let rules = config.route_rules()?;
        Ok(Self {
            include: rules.include,
            exclude: rules.exclude,
            annotation: config.annotation,
            hook_timeout: config.hook_timeout(),
            ..Self::default()
        })
    }

    /// Add patterns to the include list.
    pub fn add_include<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include.extend(parse_all(patterns)?);
        Ok(self)
    }

    /// Add patterns to the exclude list.
    pub fn add_exclude<I, S>(mut self, patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude.extend(parse_all(patterns)?);
        Ok(self)
    }

    pub fn set_include_list(mut self, list: RouteList) -> Self {
        self.include = list;
        self
    }

    pub fn set_exclude_list(mut self, list: RouteList) -> Self {
        self.exclude = list;
        self
    }

    pub fn include_list(&self) -> &RouteList {
        &self.include
    }

    pub fn exclude_list(&self) -> &RouteList {
        &self.exclude
    }

    /// Hook run before `auth`, for setup such as context enrichment.
    pub fn set_before_auth<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AuthRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControlSignal> + Send + 'static,
    {
        self.hooks.before_auth = auth_hook(f);
        self
    }

    pub fn set_auth<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AuthRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControlSignal> + Send + 'static,
    {
        self.hooks.auth = auth_hook(f);
        self
    }

    /// Hook run once for every failure.
    pub fn set_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FilterError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ErrorOutcome> + Send + 'static,
    {
        self.hooks.on_error = error_hook(f);
        self
    }

    /// Enable or disable marker handling (bypass and mandatory checks).
    pub fn annotation(mut self, enabled: bool) -> Self {
        self.annotation = enabled;
        self
    }

    pub fn marker_evaluator(mut self, evaluator: impl MarkerEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn resolver(mut self, resolver: impl HandlerResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Abandon hooks that run longer than `timeout`.
    pub fn hook_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hook_timeout = timeout;
        self
    }

    pub fn build(self) -> AuthFilter {
        AuthFilter {
            rules: ArcSwap::from_pointee(RouteRules::new(self.include, self.exclude)),
            hooks: self.hooks,
            gate: AnnotationGate::new(self.annotation, self.evaluator),
            resolver: self.resolver,
            hook_timeout: self.hook_timeout,
        }
    }
}

fn parse_all<I, S>(patterns: I) -> Result<Vec<RoutePattern>, PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| RoutePattern::parse(p.as_ref()))
        .collect()
}

/// Route-based authorization filter.
pub struct AuthFilter {
    rules: ArcSwap<RouteRules>,
    hooks: HookSet,
    gate: AnnotationGate,
    resolver: Arc<dyn HandlerResolver>,
    hook_timeout: Option<Duration>,
}

impl AuthFilter {
    pub fn builder() -> AuthFilterBuilder {
        AuthFilterBuilder::new()
    }

    pub fn include_list(&self) -> RouteList {
        self.rules.load().include.clone()
    }

    pub fn exclude_list(&self) -> RouteList {
        self.rules.load().exclude.clone()
    }

    /// Current route snapshot.
    pub fn route_rules(&self) -> Arc<RouteRules> {
        self.rules.load_full()
    }

    /// Atomically replace both route lists. In-flight requests keep the old snapshot.
    pub fn reload_routes(&self, rules: RouteRules) {
        tracing::info!(
            include = %rules.include,
            exclude = %rules.exclude,
            "route rules reloaded"
        );
        self.rules.store(Arc::new(rules));
    }

    /// Decide what happens to one request.
    pub async fn evaluate(&self, head: RequestHead) -> Verdict {
        let Some(handler) = self.resolver.resolve(&head.method, &head.path) else {
            tracing::trace!(path = %head.path, "no handler resolved, passing through");
            return Verdict::Proceed;
        };

        if self.gate.should_bypass(&handler) {
            tracing::debug!(path = %head.path, handler = %handler, "handler ignores auth");
            return Verdict::Proceed;
        }

        if !self.rules.load().applies(&head.path) {
            tracing::debug!(path = %head.path, "route not subject to auth");
            return Verdict::Proceed;
        }

        let request = AuthRequest::new(head, handler);
        let signal = match self.gate.check_mandatory_markers(&request).await {
            ControlSignal::Continue => self.hooks.run(&request, self.hook_timeout).await,
            other => other,
        };

        self.resolve(&request, signal).await
    }

    async fn resolve(&self, request: &AuthRequest, signal: ControlSignal) -> Verdict {
        match signal {
            ControlSignal::Continue | ControlSignal::Stop => Verdict::Proceed,
            ControlSignal::Result(payload) => Verdict::Respond(payload),
            ControlSignal::Fail(err) => {
                tracing::debug!(path = %request.path(), error = %err, "auth check failed");
                match self.hooks.handle_error(err, self.hook_timeout).await {
                    Ok(Some(payload)) => Verdict::Respond(payload),
                    Ok(None) => Verdict::Handled,
                    Err(err) => {
                        tracing::warn!(
                            path = %request.path(),
                            handler = %request.handler(),
                            kind = %err.kind(),
                            error = %err,
                            "authorization failure re-raised"
                        );
                        Verdict::Propagate(err)
                    }
                }
            }
        }
    }

    /// Run the filter against a host's response sink and chain.
    ///
    /// The chain runs exactly once on pass-through and never otherwise.
    pub async fn do_filter<S, C>(
        &self,
        head: RequestHead,
        sink: &mut S,
        chain: C,
    ) -> Result<(), AuthError>
    where
        S: ResponseSink + Send,
        C: FilterChain,
    {
        match self.evaluate(head).await {
            Verdict::Proceed => {
                chain.proceed().await;
                Ok(())
            }
            Verdict::Respond(payload) => {
                sink.write_response(payload);
                sink.mark_handled();
                Ok(())
            }
            Verdict::Handled => {
                sink.mark_handled();
                Ok(())
            }
            Verdict::Propagate(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for AuthFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFilter")
            .field("rules", &self.rules.load())
            .field("gate", &self.gate)
            .field("hook_timeout", &self.hook_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::meta::{HandlerMeta, Marker};
    use axum::http::{HeaderMap, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Payload>,
        handled: bool,
    }

    impl ResponseSink for RecordingSink {
        fn write_response(&mut self, payload: Payload) {
            self.writes.push(payload);
        }

        fn mark_handled(&mut self) {
            self.handled = true;
        }
    }

    struct CountingChain(Arc<AtomicUsize>);

    #[async_trait]
    impl FilterChain for CountingChain {
        async fn proceed(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new()
            .route("/login", HandlerMeta::new("login").with_marker(Marker::Ignore))
            .unwrap()
            .route("/**", HandlerMeta::new("any"))
            .unwrap()
    }

    fn head(path: &str) -> RequestHead {
        RequestHead::new(Method::GET, path, HeaderMap::new())
    }

    async fn run(filter: &AuthFilter, path: &str) -> (RecordingSink, usize, Result<(), AuthError>) {
        let mut sink = RecordingSink::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let result = filter
            .do_filter(head(path), &mut sink, CountingChain(calls.clone()))
            .await;
        (sink, calls.load(Ordering::SeqCst), result)
    }

    #[tokio::test]
    async fn test_unresolved_request_passes_through() {
        let filter = AuthFilter::builder()
            .set_auth(|_| async { ControlSignal::fail(AuthError::NotLoggedIn("x".into())) })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/static/app.js").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 1);
        assert!(sink.writes.is_empty());
    }

    #[tokio::test]
    async fn test_result_short_circuits_without_on_error() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_auth(|_| async { ControlSignal::result("maintenance") })
            .set_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/admin").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 0);
        assert_eq!(sink.writes, vec![Payload::text("maintenance")]);
        assert!(sink.handled);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_from_hook_passes_through() {
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_before_auth(|_| async { ControlSignal::Stop })
            .set_auth(|_| async { ControlSignal::fail(AuthError::NotLoggedIn("x".into())) })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/admin").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 1);
        assert!(!sink.handled);
    }

    #[tokio::test]
    async fn test_stop_from_auth_passes_through() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_auth(|_| async { ControlSignal::Stop })
            .set_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/admin").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 1);
        assert!(sink.writes.is_empty());
        assert!(!sink.handled);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    struct CountingEvaluator(Arc<AtomicUsize>);

    #[async_trait]
    impl MarkerEvaluator for CountingEvaluator {
        async fn evaluate(&self, _: &Marker, _: &AuthRequest) -> Result<(), FilterError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::NotLoggedIn("no session".into()).into())
        }
    }

    #[tokio::test]
    async fn test_excluded_route_skips_marker_checks() {
        let evaluations = Arc::new(AtomicUsize::new(0));
        let filter = AuthFilter::builder()
            .add_exclude(["/public/**"])
            .unwrap()
            .resolver(
                HandlerRegistry::new()
                    .route("/**", HandlerMeta::new("any").with_marker(Marker::CheckLogin))
                    .unwrap(),
            )
            .marker_evaluator(CountingEvaluator(evaluations.clone()))
            .build();

        let (sink, chain_calls, result) = run(&filter, "/public/docs").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 1);
        assert!(sink.writes.is_empty());
        assert_eq!(evaluations.load(Ordering::SeqCst), 0);

        // Same handler on a checked route does reach the evaluator.
        let (_, chain_calls, result) = run(&filter, "/private/docs").await;
        assert_eq!(result, Err(AuthError::NotLoggedIn("no session".into())));
        assert_eq!(chain_calls, 0);
        assert_eq!(evaluations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_on_error_without_payload_marks_handled() {
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_auth(|_| async { ControlSignal::fail(FilterError::other("backend down")) })
            .set_error(|_| async { Ok(None) })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/admin").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 0);
        assert!(sink.writes.is_empty());
        assert!(sink.handled);
    }

    #[tokio::test]
    async fn test_default_on_error_wraps_unrecognized() {
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_auth(|_| async { ControlSignal::fail(FilterError::other("backend down")) })
            .build();

        let (sink, chain_calls, result) = run(&filter, "/admin").await;
        assert_eq!(result, Err(AuthError::Generic("backend down".into())));
        assert_eq!(chain_calls, 0);
        assert!(sink.writes.is_empty());
        assert!(!sink.handled);
    }

    #[tokio::test]
    async fn test_marker_failure_skips_hooks() {
        let hooks_run = Arc::new(Mutex::new(Vec::new()));
        let before = hooks_run.clone();
        let filter = AuthFilter::builder()
            .resolver(
                HandlerRegistry::new()
                    .route("/admin", HandlerMeta::new("admin").with_marker(Marker::CheckLogin))
                    .unwrap(),
            )
            .set_before_auth(move |_| {
                before.lock().unwrap().push("before_auth");
                async { ControlSignal::Continue }
            })
            .build();

        let (_, chain_calls, result) = run(&filter, "/admin").await;
        assert!(matches!(result, Err(AuthError::Generic(_))));
        assert_eq!(chain_calls, 0);
        assert!(hooks_run.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_annotation_disabled_ignores_markers() {
        let filter = AuthFilter::builder()
            .resolver(registry())
            .annotation(false)
            .set_auth(|_| async { ControlSignal::fail(AuthError::NotLoggedIn("x".into())) })
            .build();

        // `/login` carries Ignore, but markers are switched off.
        let (_, chain_calls, result) = run(&filter, "/login").await;
        assert!(result.is_err());
        assert_eq!(chain_calls, 0);
    }

    #[tokio::test]
    async fn test_reload_swaps_route_snapshot() {
        let filter = AuthFilter::builder()
            .resolver(registry())
            .set_auth(|_| async { ControlSignal::fail(AuthError::NotLoggedIn("x".into())) })
            .build();

        assert!(run(&filter, "/reports").await.2.is_err());

        filter.reload_routes(RouteRules::new(
            RouteList::new(),
            RouteList::parse(["/reports/**"]).unwrap(),
        ));
        assert_eq!(filter.exclude_list().to_strings(), vec!["/reports/**".to_string()]);

        let (_, chain_calls, result) = run(&filter, "/reports").await;
        assert!(result.is_ok());
        assert_eq!(chain_calls, 1);
    }

    #[test]
    fn test_builder_route_api() {
        let builder = AuthFilter::builder()
            .add_include(["/api/**"])
            .unwrap()
            .add_exclude(["/api/public/**", "/api/login"])
            .unwrap();
        assert_eq!(builder.include_list().len(), 1);
        assert_eq!(builder.exclude_list().len(), 2);

        let builder = builder.set_exclude_list(RouteList::new());
        assert!(builder.exclude_list().is_empty());
        assert!(AuthFilter::builder().add_include(["/bad*"]).is_err());
    }
}
