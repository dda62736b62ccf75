//! Route pattern subsystem.
//!
//! # Data Flow
//! ```text
//! Configured patterns ("/api/**", "/public/*")
//!     → matcher.rs (parse into segments)
//!     → list.rs (include / exclude collections)
//!     → RouteRules::applies(path) → bool
//! ```
//!
//! # Design Decisions
//! - Patterns are parsed once at configuration time, immutable afterwards
//! - List membership only: insertion order never changes the outcome
//! - An empty include list behaves like a single `/**`

pub mod list;
pub mod matcher;

pub use list::{RouteList, RouteRules};
pub use matcher::{matches, split_path, PatternError, RoutePattern};
