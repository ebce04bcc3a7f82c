use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use super::{load_config, EngineConfig};

/// Watch a config file and broadcast swapped configs.
///
/// Receivers hold an `Arc<EngineConfig>` borrowed at evaluation start, so
/// a reload is an atomic swap visible only to evaluations that start
/// afterwards; nothing observes a half-applied config.
pub struct ConfigWatcher {
    path: PathBuf,
    check_interval: Duration,
    last_version: Option<String>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, check_interval: Duration) -> Self {
        ConfigWatcher {
            path: path.into(),
            check_interval,
            last_version: None,
        }
    }

    /// Load the initial config and start the reload loop.
    ///
    /// A failed initial load falls back to `EngineConfig::default()`
    /// (zero v2 traffic, default thresholds) so the engine still comes up
    /// in its most conservative shape.
    pub fn start(
        mut self,
    ) -> (
        watch::Receiver<Arc<EngineConfig>>,
        tokio::task::JoinHandle<()>,
    ) {
        let initial = match load_config(&self.path) {
            Ok(config) => {
                info!(version = %config.config_version, "loaded initial engine config");
                self.last_version = Some(config.config_version.clone());
                Arc::new(config)
            }
            Err(e) => {
                error!(error = %e, "failed to load initial engine config, using defaults");
                Arc::new(EngineConfig::default())
            }
        };

        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);
            interval.tick().await; // first tick fires immediately

            loop {
                interval.tick().await;

                match load_config(&self.path) {
                    Ok(config) => {
                        let changed = self.last_version.as_deref()
                            != Some(config.config_version.as_str());
                        if changed {
                            info!(version = %config.config_version, "engine config reloaded");
                            self.last_version = Some(config.config_version.clone());
                            if tx.send(Arc::new(config)).is_err() {
                                // All receivers dropped; nothing left to serve.
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        // Keep serving the last good config.
                        warn!(error = %e, "engine config reload failed, keeping current");
                    }
                }
            }
        });

        (rx, handle)
    }
}
