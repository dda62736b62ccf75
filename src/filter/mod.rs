//! Authorization filter subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, path, headers)
//!     → orchestrator.rs (state machine, Verdict)
//!         → handler::HandlerResolver (which handler?)
//!         → gate.rs (Ignore marker? mandatory markers)
//!         → routing::RouteRules (include / exclude)
//!         → hooks.rs (before_auth → auth, on_error)
//!     → signal.rs (ControlSignal, AuthError, Payload)
//!     → Verdict: Proceed | Respond | Handled | Propagate
//! ```
//!
//! # Design Decisions
//! - Short-circuits are values (`ControlSignal`), not panics
//! - `Stop` is a normal outcome and is never reported as an error
//! - Failures always pass through exactly one `on_error` call

pub mod context;
pub mod gate;
pub mod hooks;
pub mod orchestrator;
pub mod signal;

pub use context::{AuthRequest, RequestHead};
pub use gate::{AnnotationGate, MarkerEvaluator, UnconfiguredEvaluator};
pub use hooks::{default_error_handler, ErrorOutcome, HookSet};
pub use orchestrator::{AuthFilter, AuthFilterBuilder, FilterChain, ResponseSink, Verdict};
pub use signal::{AuthError, AuthErrorKind, ControlSignal, FilterError, Payload, PayloadBody};
