//! Marker evaluation backed by request headers.
//!
//! # Data Flow
//! ```text
//! AnnotationGate
//!     → header_evaluator.rs (Authorization, X-Roles, X-Permissions, X-Disabled)
//!     → Ok(()) or AuthError
//! ```
//!
//! # Design Decisions
//! - Trusts headers set by an upstream identity proxy; no token verification
//! - Missing headers are treated as "nothing granted"

pub mod header_evaluator;

pub use header_evaluator::HeaderMarkerEvaluator;
