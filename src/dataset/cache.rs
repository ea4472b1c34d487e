//! Dataset cache with an explicit refresh policy.
//!
//! # States
//! - Unloaded: no snapshot published yet
//! - Loaded: one current snapshot, swapped atomically on refresh
//!
//! # Design Decisions
//! - Readers take an `Arc<Snapshot>`; a refresh never touches a snapshot
//!   already handed out, so in-flight matches finish on the data they started with
//! - No lock around reload: concurrent refreshes may each read the source
//!   (cache stampede). Known limitation, see DESIGN.md.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};

use crate::dataset::snapshot::Snapshot;
use crate::dataset::source::{DatasetError, DatasetSource};
use crate::observability::metrics;

/// When the cache goes back to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPolicy {
    /// Reload immediately before every match.
    Always,
    /// Load on first use and keep until an explicit refresh.
    Lazy,
}

impl RefreshPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshPolicy::Always => "always",
            RefreshPolicy::Lazy => "lazy",
        }
    }
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(RefreshPolicy::Always),
            "lazy" => Ok(RefreshPolicy::Lazy),
            other => Err(format!("unknown refresh policy '{}' (expected 'always' or 'lazy')", other)),
        }
    }
}

/// Owns the current dataset snapshot.
#[derive(Debug)]
pub struct DatasetCache {
    source: Arc<dyn DatasetSource>,
    current: ArcSwapOption<Snapshot>,
    /// Number of snapshots published so far.
    generation: AtomicU64,
}

impl DatasetCache {
    /// Create an unloaded cache over the given source.
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            current: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot, loading it on first use.
    pub fn current(&self) -> Result<Arc<Snapshot>, DatasetError> {
        match self.current.load_full() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh(),
        }
    }

    /// Reload from the source and publish the result as the current snapshot.
    ///
    /// On failure the previous snapshot (if any) stays current.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, DatasetError> {
        let text = match self.source.load() {
            Ok(text) => text,
            Err(e) => {
                metrics::record_dataset_reload(false);
                return Err(e);
            }
        };

        let snapshot = Arc::new(Snapshot::new(text, self.source.describe()));
        self.current.store(Some(Arc::clone(&snapshot)));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_dataset_reload(true);

        tracing::debug!(
            origin = %snapshot.origin(),
            lines = snapshot.line_count(),
            bytes = snapshot.text().len(),
            generation,
            "Dataset snapshot published"
        );
        Ok(snapshot)
    }

    /// Snapshot to match against under the given policy.
    pub fn resolve(&self, policy: RefreshPolicy) -> Result<Arc<Snapshot>, DatasetError> {
        match policy {
            RefreshPolicy::Always => self.refresh(),
            RefreshPolicy::Lazy => self.current(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// How many snapshots have been published.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn source(&self) -> &Arc<dyn DatasetSource> {
        &self.source
    }
}
