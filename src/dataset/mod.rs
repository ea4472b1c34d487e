//! Dataset subsystem.
//!
//! # Data Flow
//! ```text
//! dataset file
//!     → source.rs (read full text, FileAccess/Encoding errors)
//!     → snapshot.rs (immutable text + line spans)
//!     → cache.rs (current snapshot behind ArcSwap, refresh policy)
//!     → handed to the matching engine for one query
//!
//! Explicit refresh triggers:
//!     SIGHUP (lifecycle/signals.rs) → cache.refresh()
//!     watcher.rs (optional file watch) → cache.refresh()
//! ```
//!
//! # Design Decisions
//! - Snapshots are never mutated; refresh publishes a new one
//! - The cache is an owned object passed to handlers, not global state
//! - Refresh policy is injected per server, never a hidden flag

pub mod cache;
pub mod snapshot;
pub mod source;
pub mod watcher;

pub use cache::{DatasetCache, RefreshPolicy};
pub use snapshot::Snapshot;
pub use source::{DatasetError, DatasetSource, FileSource};
