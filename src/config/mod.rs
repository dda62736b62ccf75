//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → AuthFilterBuilder::from_config
//!
//! On file change:
//!     watcher.rs detects change (event in the parent directory naming the file)
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → RouteRules sent over mpsc when they differ from the last snapshot
//!     → AuthFilter::reload_routes (atomic swap of route snapshot)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Only route lists are hot-reloadable; hooks are fixed at build time

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AuthConfig, GuardConfig, ListenerConfig, ObservabilityConfig};
pub use watcher::ConfigWatcher;
