//! Handler lookup.
//!
//! # Responsibilities
//! - Map (method, path) to the handler that will serve the request
//! - Report "no handler" explicitly for unmapped paths and static assets
//!
//! # Design Decisions
//! - Registration order is lookup order: first match wins
//! - A registration without a method serves every method
//! - Immutable after construction (thread-safe without locks)

use axum::http::Method;

use crate::handler::meta::HandlerMeta;
use crate::routing::matcher::{split_path, PatternError, RoutePattern};

/// Resolves the handler a request maps to.
pub trait HandlerResolver: Send + Sync {
    /// Returns the matched handler, or None if the request is not routed.
    fn resolve(&self, method: &Method, path: &str) -> Option<HandlerMeta>;
}

#[derive(Debug, Clone)]
struct Registration {
    method: Option<Method>,
    pattern: RoutePattern,
    meta: HandlerMeta,
}

/// A static, ordered handler table.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    entries: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every method.
    pub fn route(self, pattern: &str, meta: HandlerMeta) -> Result<Self, PatternError> {
        self.register(None, pattern, meta)
    }

    /// Register a handler for a single method.
    pub fn route_method(
        self,
        method: Method,
        pattern: &str,
        meta: HandlerMeta,
    ) -> Result<Self, PatternError> {
        self.register(Some(method), pattern, meta)
    }

    fn register(
        mut self,
        method: Option<Method>,
        pattern: &str,
        meta: HandlerMeta,
    ) -> Result<Self, PatternError> {
        let pattern = RoutePattern::parse(pattern)?;
        self.entries.push(Registration {
            method,
            pattern,
            meta,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, method: &Method, path: &str) -> Option<HandlerMeta> {
        let segments = split_path(path);
        self.entries
            .iter()
            .find(|e| {
                e.method.as_ref().map_or(true, |m| m == method)
                    && e.pattern.matches_segments(&segments)
            })
            .map(|e| e.meta.clone())
    }
}
