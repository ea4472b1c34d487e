//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP refreshes the dataset snapshot, not shutdown

use std::sync::Arc;

use crate::dataset::DatasetCache;

/// Resolve when the process is asked to stop (Ctrl+C, or SIGTERM on Unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Spawn a task that refreshes the dataset on every SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(cache: Arc<DatasetCache>) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match cache.refresh() {
                Ok(snapshot) => tracing::info!(
                    lines = snapshot.line_count(),
                    generation = cache.generation(),
                    "SIGHUP: dataset snapshot refreshed"
                ),
                Err(e) => tracing::error!(error = %e, "SIGHUP: dataset reload failed, keeping current snapshot"),
            }
        }
    }))
}

/// SIGHUP does not exist off Unix; refresh happens via the watcher only.
#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_cache: Arc<DatasetCache>) -> std::io::Result<tokio::task::JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::dataset::FileSource;
    use crate::matching::{Strategy, Verdict};
    use std::time::Duration;

    #[tokio::test]
    async fn hangup_refreshes_dataset() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "A\n").unwrap();

        let cache = Arc::new(DatasetCache::new(Arc::new(FileSource::new(file.path()))));
        cache.refresh().unwrap();
        let before = cache.generation();

        let _task = spawn_reload_on_hangup(Arc::clone(&cache)).unwrap();
        std::fs::write(file.path(), "A\nX\n").unwrap();

        let status = tokio::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .await
            .unwrap();
        assert!(status.success());

        let refreshed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = cache.current().unwrap();
                if cache.generation() > before && Strategy::Linear.find("X", &snapshot) == Verdict::Found {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(refreshed.is_ok(), "SIGHUP did not refresh the dataset");
    }
}
