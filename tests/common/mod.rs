//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::get,
    Router,
};
use tower::ServiceExt;

use route_guard::filter::AuthFilter;
use route_guard::handler::{HandlerMeta, HandlerRegistry, Marker};
use route_guard::http::middleware;

/// Ordered log of hook and handler invocations.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    pub fn push(&self, name: &'static str) {
        self.0.lock().unwrap().push(name);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == name).count()
    }
}

/// Handlers for `/admin`, `/public/x` and `/login` (which ignores auth).
pub fn registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .route("/login", HandlerMeta::new("login").with_marker(Marker::Ignore))
        .unwrap()
        .route("/admin", HandlerMeta::new("admin").declared_in("AdminController"))
        .unwrap()
        .route("/public/**", HandlerMeta::new("public"))
        .unwrap()
}

/// The application router; every handler records itself as "handler".
pub fn app(log: &CallLog, filter: Arc<AuthFilter>) -> Router {
    let handler = |log: CallLog| {
        move || {
            let log = log.clone();
            async move {
                log.push("handler");
                "from handler"
            }
        }
    };

    let router = Router::new()
        .route("/login", get(handler(log.clone())))
        .route("/admin", get(handler(log.clone())))
        .route("/public/x", get(handler(log.clone())));
    middleware::apply(router, filter)
}

/// Send a GET and return status and body text.
pub async fn get_path(router: Router, path: &str) -> (StatusCode, String) {
    send(router, Request::builder().method(Method::GET).uri(path)).await
}

pub async fn send(router: Router, request: axum::http::request::Builder) -> (StatusCode, String) {
    let response = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
