//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::routing::list::{RouteList, RouteRules};
use crate::routing::matcher::PatternError;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Route lists and hook behaviour of the auth filter.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Auth filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Patterns checked by the filter. Empty means every path.
    pub include: Vec<String>,

    /// Patterns never checked, even if included.
    pub exclude: Vec<String>,

    /// Honour handler markers (ignore / mandatory checks).
    pub annotation: bool,

    /// Per-hook timeout in milliseconds; 0 disables it.
    pub hook_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            include: vec!["/**".to_string()],
            exclude: Vec::new(),
            annotation: true,
            hook_timeout_ms: 0,
        }
    }
}

impl AuthConfig {
    pub fn route_rules(&self) -> Result<RouteRules, PatternError> {
        Ok(RouteRules::new(
            RouteList::parse(&self.include)?,
            RouteList::parse(&self.exclude)?,
        ))
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        (self.hook_timeout_ms > 0).then(|| Duration::from_millis(self.hook_timeout_ms))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GuardConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.auth, AuthConfig::default());
        assert_eq!(config.observability.log_level, "info");
        assert!(config.auth.hook_timeout().is_none());
    }

    #[test]
    fn test_auth_section() {
        let config: GuardConfig = toml::from_str(
            r#"
            [auth]
            include = ["/api/**"]
            exclude = ["/api/login", "/api/public/**"]
            annotation = false
            hook_timeout_ms = 250
            "#,
        )
        .unwrap();

        let rules = config.auth.route_rules().unwrap();
        assert!(rules.applies("/api/users"));
        assert!(!rules.applies("/api/login"));
        assert!(!config.auth.annotation);
        assert_eq!(config.auth.hook_timeout(), Some(Duration::from_millis(250)));
    }
}
