//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace + timeout layers)
//!     → middleware.rs (AuthFilter::do_filter)
//!         → pass-through: application handler
//!         → short-circuit: response.rs (Payload / AuthError rendering)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use middleware::{apply, auth_filter_middleware};
pub use server::GuardServer;
