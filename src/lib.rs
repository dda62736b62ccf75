//! Route-based authorization filter for axum services.

pub mod config;
pub mod filter;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GuardConfig;
pub use filter::{AuthError, AuthFilter, AuthFilterBuilder, ControlSignal, Payload, Verdict};
pub use handler::{HandlerMeta, HandlerRegistry, Marker};
pub use http::GuardServer;
