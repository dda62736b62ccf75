//! Configuration file watcher for hot reload of route rules.
//!
//! # Responsibilities
//! - Watch the directory holding the config file and react to events naming it
//! - Reload, validate and convert the file into a fresh [`RouteRules`] snapshot
//! - Report settings that only take effect at build time
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: editors and deploy tools
//!   replace configs by renaming a new file over the old one, which retires
//!   the inode a file watch is bound to
//! - Only route rules are sent; unchanged rules are not resent
//! - A config that fails to load keeps the current rules in place

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AuthConfig;
use crate::routing::list::RouteRules;

/// A watcher that turns config file changes into route rule updates.
pub struct ConfigWatcher {
    path: PathBuf,
    reload: Reload,
}

/// Per-watcher reload state, owned by the notify callback.
struct Reload {
    path: PathBuf,
    baseline: AuthConfig,
    last_auth: AuthConfig,
    last_rules: Option<RouteRules>,
    update_tx: mpsc::UnboundedSender<RouteRules>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// `baseline` is the auth section the running filter was built from.
    /// Returns the watcher and a receiver for route rule updates.
    pub fn new(path: &Path, baseline: &AuthConfig) -> (Self, mpsc::UnboundedReceiver<RouteRules>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                reload: Reload {
                    path: path.to_path_buf(),
                    baseline: baseline.clone(),
                    last_auth: baseline.clone(),
                    last_rules: baseline.route_rules().ok(),
                    update_tx,
                },
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsString::from).ok_or_else(|| {
            notify::Error::generic("config path has no file name")
                .add_path(self.path.clone())
        })?;

        let mut reload = self.reload;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let names_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if names_config && (event.kind.is_modify() || event.kind.is_create()) {
                        reload.apply();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

impl Reload {
    fn apply(&mut self) {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(
                    "Failed to reload config: {}. Keeping current route rules.",
                    e
                );
                return;
            }
        };

        let auth = config.auth;
        if auth.annotation != self.last_auth.annotation && auth.annotation != self.baseline.annotation {
            tracing::warn!(
                running = self.baseline.annotation,
                configured = auth.annotation,
                "auth.annotation changed; restart to apply"
            );
        }
        if auth.hook_timeout_ms != self.last_auth.hook_timeout_ms
            && auth.hook_timeout_ms != self.baseline.hook_timeout_ms
        {
            tracing::warn!(
                running = self.baseline.hook_timeout_ms,
                configured = auth.hook_timeout_ms,
                "auth.hook_timeout_ms changed; restart to apply"
            );
        }

        let rules = match auth.route_rules() {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "Ignoring invalid route rules");
                return;
            }
        };
        self.last_auth = auth;

        if self.last_rules.as_ref() == Some(&rules) {
            tracing::debug!("Config change left route rules untouched");
            return;
        }

        tracing::info!(include = %rules.include, exclude = %rules.exclude, "Route rules reloaded");
        self.last_rules = Some(rules.clone());
        let _ = self.update_tx.send(rules);
    }
}
