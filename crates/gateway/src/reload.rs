//! Live config reload.
//!
//! Feed destinations and the webhook secret follow the config file while the
//! server runs. Chat connection settings and the listen address are read once
//! at startup.

use std::{path::Path, sync::Arc};

use {
    hookfeed_config::{ConfigWatchEvent, ConfigWatcher},
    hookfeed_relay::{Relay, RelaySettings, SelfCheckReport},
    tracing::{info, warn},
};

/// Re-read `path` and swap the result into `relay`.
///
/// On error the current settings stay in place.
pub async fn reload_config(
    path: &Path,
    relay: &Relay,
) -> Result<SelfCheckReport, hookfeed_config::Error> {
    let config = hookfeed_config::load_config(path)?;
    let report = relay.reload(RelaySettings::from_config(&config)).await;
    info!(path = %path.display(), passed = report.passed(), "config reloaded");
    Ok(report)
}

/// Watch `path` and reload `relay` on every change until the returned watcher
/// is dropped.
pub fn watch_config(path: &Path, relay: Arc<Relay>) -> anyhow::Result<ConfigWatcher> {
    let (watcher, mut rx) = ConfigWatcher::start(path)?;

    tokio::spawn(async move {
        while let Some(ConfigWatchEvent::Changed(path)) = rx.recv().await {
            if let Err(e) = reload_config(&path, &relay).await {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "config reload failed, keeping current settings"
                );
            }
        }
    });

    Ok(watcher)
}
