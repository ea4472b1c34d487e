//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::task::JoinHandle;

use linequery::config::ServerConfig;
use linequery::dataset::{DatasetCache, FileSource, RefreshPolicy};
use linequery::net::{ConnectionTracker, Listener, ListenerError};
use linequery::{SearchServer, Shutdown};

/// A running server on an ephemeral port, backed by a temp dataset file.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dataset: NamedTempFile,
    pub shutdown: Shutdown,
    pub tracker: ConnectionTracker,
    pub task: JoinHandle<Result<(), ListenerError>>,
}

impl TestServer {
    /// Append text to the dataset file in place.
    pub fn append(&mut self, text: &str) {
        self.dataset.write_all(text.as_bytes()).unwrap();
        self.dataset.flush().unwrap();
    }
}

pub fn dataset(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Start a server with default settings and the given refresh policy.
pub async fn start_server(content: &str, policy: RefreshPolicy) -> TestServer {
    start_server_with(content, |config| config.dataset.refresh_policy = Some(policy)).await
}

/// Start a server after letting the caller adjust the config.
pub async fn start_server_with(content: &str, configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let dataset = dataset(content);

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.dataset.path = Some(dataset.path().display().to_string());
    configure(&mut config);

    let cache = Arc::new(DatasetCache::new(Arc::new(FileSource::new(dataset.path()))));
    if config.dataset.preload {
        cache.refresh().unwrap();
    }

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = SearchServer::new(&config, cache).unwrap();
    let tracker = server.tracker();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        dataset,
        shutdown,
        tracker,
        task,
    }
}
