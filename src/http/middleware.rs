//! axum bridge for the auth filter.
//!
//! # Responsibilities
//! - Extract the request head and run `AuthFilter::do_filter`
//! - Call `next` only on pass-through
//! - Return re-raised failures to axum as errors
//!
//! # Design Decisions
//! - Applied with `Router::layer`, so unmapped paths reach the filter too
//!   and pass through (the resolver reports no handler)
//! - A handled request without payload gets an empty 200

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::filter::context::RequestHead;
use crate::filter::orchestrator::{AuthFilter, FilterChain, ResponseSink};
use crate::filter::signal::{AuthError, Payload};

/// Apply the filter to every route of `router`.
///
/// ```ignore
/// let filter = Arc::new(AuthFilter::builder().add_exclude(["/public/**"])?.build());
/// let app = http::middleware::apply(Router::new().route("/", get(index)), filter);
/// ```
pub fn apply<S>(router: Router<S>, filter: Arc<AuthFilter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(filter, auth_filter_middleware))
}

/// Collects what the filter writes.
#[derive(Debug, Default)]
struct ResponseSlot {
    payload: Option<Payload>,
    handled: bool,
}

impl ResponseSink for ResponseSlot {
    fn write_response(&mut self, payload: Payload) {
        self.payload = Some(payload);
    }

    fn mark_handled(&mut self) {
        self.handled = true;
    }
}

impl IntoResponse for ResponseSlot {
    fn into_response(self) -> Response {
        match self.payload {
            Some(payload) => payload.into_response(),
            None => Response::default(),
        }
    }
}

struct NextChain<'a> {
    next: Next,
    request: Request<Body>,
    response: &'a mut Option<Response>,
}

#[async_trait]
impl<'a> FilterChain for NextChain<'a> {
    async fn proceed(self) {
        let NextChain {
            next,
            request,
            response,
        } = self;
        *response = Some(next.run(request).await);
    }
}

pub async fn auth_filter_middleware(
    State(filter): State<Arc<AuthFilter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let head = RequestHead::new(
        request.method().clone(),
        request.uri().path(),
        request.headers().clone(),
    );

    let mut slot = ResponseSlot::default();
    let mut downstream = None;
    let chain = NextChain {
        next,
        request,
        response: &mut downstream,
    };

    filter.do_filter(head, &mut slot, chain).await?;

    match downstream {
        Some(response) => Ok(response),
        None => {
            tracing::debug!(handled = slot.handled, "request answered by auth filter");
            Ok(slot.into_response())
        }
    }
}
