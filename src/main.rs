//! route-guard demo server
//!
//! An axum application guarded by the route-based auth filter.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ TraceLayer ─▶ TimeoutLayer ─▶ auth filter ─┬─▶ handler
//!                                                                 │
//!                      ┌──────────────────────────────────────────┘
//!                      │ resolve handler → ignore marker? → include/exclude
//!                      │ → marker checks → before_auth → auth → on_error
//!                      ▼
//!     Client Response ◀─ payload / error response / handler response
//! ```
//!
//! Identity comes from headers (`Authorization: Bearer ..`, `X-Roles`,
//! `X-Permissions`, `X-Disabled`); see `security::header_evaluator`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::Path, http::Method, routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use route_guard::config::{load_config, ConfigWatcher, GuardConfig};
use route_guard::filter::{AuthFilterBuilder, AuthRequest, ControlSignal, FilterError, Payload};
use route_guard::handler::{HandlerMeta, HandlerRegistry, Marker};
use route_guard::observability::init_logging;
use route_guard::security::HeaderMarkerEvaluator;
use route_guard::GuardServer;

#[derive(Parser)]
#[command(name = "route-guard")]
#[command(about = "Demo server for the route-based auth filter", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload route lists when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("route-guard v0.1.0 starting");

    let filter = Arc::new(
        AuthFilterBuilder::from_config(&config.auth)?
            .resolver(handlers()?)
            .marker_evaluator(HeaderMarkerEvaluator::new())
            .set_before_auth(|request: AuthRequest| async move {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.path(),
                    handler = %request.handler(),
                    "checking request"
                );
                ControlSignal::Continue
            })
            .set_auth(|request: AuthRequest| async move {
                if request.header("x-maintenance").is_some() {
                    return ControlSignal::result(
                        Payload::json(json!({ "status": "maintenance" }))
                            .with_status(axum::http::StatusCode::SERVICE_UNAVAILABLE),
                    );
                }
                ControlSignal::Continue
            })
            .set_error(|err: FilterError| async move {
                match err {
                    FilterError::Auth(e) => Err(e),
                    FilterError::Other(e) => {
                        tracing::error!(error = %e, "unexpected auth failure");
                        Ok(Some(
                            Payload::json(json!({ "error": "temporarily unavailable" }))
                                .with_status(axum::http::StatusCode::SERVICE_UNAVAILABLE),
                        ))
                    }
                }
            })
            .build(),
    );

    tracing::info!(
        bind_address = %config.listener.bind_address,
        include = %filter.include_list(),
        exclude = %filter.exclude_list(),
        annotation = config.auth.annotation,
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path, &config.auth);
            let watcher = watcher.run()?;
            let filter = filter.clone();
            tokio::spawn(async move {
                while let Some(rules) = updates.recv().await {
                    filter.reload_routes(rules);
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GuardServer::new(config, app(), filter);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn handlers() -> Result<HandlerRegistry, route_guard::routing::PatternError> {
    HandlerRegistry::new()
        .route_method(
            Method::GET,
            "/health",
            HandlerMeta::new("health").with_marker(Marker::Ignore),
        )?
        .route_method(
            Method::GET,
            "/public/**",
            HandlerMeta::new("public").declared_in("PublicController"),
        )?
        .route_method(
            Method::GET,
            "/users/*",
            HandlerMeta::new("get_user")
                .declared_in("UserController")
                .with_type_marker(Marker::CheckLogin),
        )?
        .route_method(
            Method::DELETE,
            "/users/*",
            HandlerMeta::new("delete_user")
                .declared_in("UserController")
                .with_type_marker(Marker::CheckLogin)
                .with_marker(Marker::permission("user:delete")),
        )?
        .route(
            "/admin/**",
            HandlerMeta::new("admin")
                .declared_in("AdminController")
                .with_type_marker(Marker::role("admin"))
                .with_marker(Marker::CheckDisable {
                    service: "admin".to_string(),
                }),
        )
}

fn app() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/public/{*rest}", get(public))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/admin", get(admin))
        .route("/admin/{*rest}", get(admin))
}

async fn public(Path(rest): Path<String>) -> Json<Value> {
    Json(json!({ "public": rest }))
}

async fn get_user(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn delete_user(Path(id): Path<String>) -> Json<Value> {
    Json(json!({ "deleted": id }))
}

async fn admin() -> Json<Value> {
    Json(json!({ "admin": true }))
}
