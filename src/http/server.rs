//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap an application router with the auth filter
//! - Wire up middleware (tracing, request timeout)
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GuardConfig;
use crate::filter::orchestrator::AuthFilter;
use crate::http::middleware;
use crate::lifecycle::signals::shutdown_signal;

/// HTTP server guarding an application router.
pub struct GuardServer {
    router: Router,
    config: GuardConfig,
    filter: Arc<AuthFilter>,
}

impl GuardServer {
    /// Create a new server around `app`.
    pub fn new(config: GuardConfig, app: Router, filter: Arc<AuthFilter>) -> Self {
        let router = Self::build_router(&config, app, filter.clone());
        Self {
            router,
            config,
            filter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GuardConfig, app: Router, filter: Arc<AuthFilter>) -> Router {
        middleware::apply(app, filter)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            include = %self.filter.include_list(),
            exclude = %self.filter.exclude_list(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn filter(&self) -> &Arc<AuthFilter> {
        &self.filter
    }
}
