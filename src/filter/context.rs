//! Per-request views handed to the filter and its hooks.

use std::sync::Arc;

use axum::http::{HeaderMap, Method};

use crate::handler::meta::HandlerMeta;

/// The parts of an inbound request the filter decides on.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

impl RequestHead {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
        }
    }
}

/// A request that resolved to a handler and is subject to checks.
///
/// Cheap to clone; each hook receives its own handle.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    head: RequestHead,
    handler: HandlerMeta,
}

impl AuthRequest {
    pub fn new(head: RequestHead, handler: HandlerMeta) -> Self {
        Self {
            inner: Arc::new(Inner { head, handler }),
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.head.method
    }

    pub fn path(&self) -> &str {
        &self.inner.head.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.head.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn handler(&self) -> &HandlerMeta {
        &self.inner.handler
    }
}
