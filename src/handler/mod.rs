//! Handler metadata and resolution.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → registry.rs (HandlerResolver lookup)
//!     → meta.rs (HandlerMeta: name, declaring type, markers)
//!     → Return: Some(HandlerMeta) or None for unmapped paths
//! ```
//!
//! # Design Decisions
//! - The filter only reads metadata; it never mutates handlers
//! - Markers are plain data, evaluated elsewhere (see `filter::gate`)
//! - Registry is immutable once built and shared via Arc

pub mod meta;
pub mod registry;

pub use meta::{HandlerMeta, MatchMode, Marker, MarkerKind};
pub use registry::{HandlerRegistry, HandlerResolver};
