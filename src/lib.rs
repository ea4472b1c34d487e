//! Exact-line query server library.

pub mod client;
pub mod config;
pub mod dataset;
pub mod lifecycle;
pub mod matching;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod server;

pub use client::{ClientError, QueryClient};
pub use config::schema::ServerConfig;
pub use dataset::{DatasetCache, RefreshPolicy, Snapshot};
pub use lifecycle::Shutdown;
pub use matching::{MatchEngine, Strategy, Verdict};
pub use server::SearchServer;
