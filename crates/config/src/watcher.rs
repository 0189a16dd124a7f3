//! Filesystem watcher for the config file.
//!
//! Watches the directory holding the config file, so editors that save by
//! writing a temp file and renaming it over the original are still seen, and
//! sends a notification for every debounced change to that one file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use {
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
        notify::{self, EventKind, RecommendedWatcher, RecursiveMode},
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Events emitted by the config watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWatchEvent {
    /// The config file was created, modified, or removed.
    Changed(PathBuf),
}

/// Watches one config file with debouncing.
pub struct ConfigWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl ConfigWatcher {
    /// Start watching `path`. Returns the watcher and a receiver for events.
    ///
    /// The watcher must be kept alive (not dropped) for events to continue.
    pub fn start(path: &Path) -> notify::Result<(Self, mpsc::UnboundedReceiver<ConfigWatchEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let file_name = path.file_name().map(ToOwned::to_owned);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let watched = path.to_path_buf();

        let mut debouncer = new_debouncer(
            DEBOUNCE,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let changed = events.iter().any(|event| {
                        let relevant = matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        );
                        relevant
                            && event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == file_name.as_deref())
                    });
                    if changed {
                        debug!(path = %watched.display(), "config watcher event");
                        let _ = tx.send(ConfigWatchEvent::Changed(watched.clone()));
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "config watcher error");
                    }
                },
            },
        )?;

        debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %path.display(), "config watcher: watching file");

        let watcher = Self {
            _debouncer: debouncer,
        };
        Ok((watcher, rx))
    }
}
