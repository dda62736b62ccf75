//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!
//! Consumers:
//!     → stdout (fmt layer), filtered by EnvFilter
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, handler, kind) rather than formatted strings
//! - Excluded and bypassed requests log at debug/trace only

pub mod logging;

pub use logging::init_logging;
