//! Dataset file watcher.
//!
//! Turns modifications of the dataset file into explicit cache refreshes.
//! Only started when `dataset.watch` is enabled; with it off, a lazy cache
//! stays on its first snapshot until SIGHUP.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::dataset::cache::DatasetCache;

/// Watches the dataset file and refreshes the cache when it changes.
pub struct DatasetWatcher {
    path: PathBuf,
    cache: Arc<DatasetCache>,
}

impl DatasetWatcher {
    pub fn new(path: &Path, cache: Arc<DatasetCache>) -> Self {
        Self {
            path: path.to_path_buf(),
            cache,
        }
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let cache = Arc::clone(&self.cache);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        match cache.refresh() {
                            Ok(snapshot) => tracing::info!(
                                lines = snapshot.line_count(),
                                generation = cache.generation(),
                                "Dataset change detected, snapshot refreshed"
                            ),
                            Err(e) => tracing::error!(
                                error = %e,
                                "Dataset reload failed, keeping current snapshot"
                            ),
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Dataset watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Dataset watcher started");
        Ok(watcher)
    }
}
