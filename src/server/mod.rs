//! Query server subsystem.
//!
//! # Data Flow
//! ```text
//! Listener::accept (permit held)
//!     → ConnectionTracker::track (guard held)
//!     → optional TLS handshake
//!     → handler.rs (frame loop: decode → resolve → match → respond)
//!     → close: guard and permit dropped
//! ```
//!
//! # Design Decisions
//! - One task per connection; the scan runs inline in that task
//! - Handler errors are logged in the task and never reach the accept loop
//! - Shutdown stops accepting; in-flight connections drain on their own

pub mod handler;

pub use handler::{ConnectionHandler, HandlerError};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;

use crate::config::{ConfigError, ServerConfig};
use crate::dataset::DatasetCache;
use crate::matching::MatchEngine;
use crate::net::{CloseReason, ConnectionId, ConnectionTracker, Listener, ListenerError};
use crate::protocol::FrameCodec;

/// Accepts connections and serves each one on its own task.
pub struct SearchServer {
    handler: Arc<ConnectionHandler>,
    tls: Option<TlsAcceptor>,
    tracker: ConnectionTracker,
}

impl SearchServer {
    /// Build a server from validated configuration.
    pub fn new(config: &ServerConfig, cache: Arc<DatasetCache>) -> Result<Self, ConfigError> {
        let policy = config.dataset.require_policy()?;
        let idle = config.timeouts.idle_secs;

        let handler = ConnectionHandler::new(cache, policy, MatchEngine::new(config.dataset.strategy))
            .with_codec(FrameCodec::new(config.protocol.max_payload_bytes))
            .with_malformed_allowance(config.protocol.malformed_header_allowance)
            .with_idle_timeout((idle > 0).then(|| Duration::from_secs(idle)));

        Ok(Self::from_handler(handler))
    }

    pub fn from_handler(handler: ConnectionHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            tls: None,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Wrap every accepted stream in TLS.
    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls = Some(acceptor);
        self
    }

    /// Handle for observing active connections, e.g. to drain on shutdown.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until the shutdown signal fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        tracing::info!(
            address = ?listener.local_addr().ok(),
            strategy = %self.handler.engine().strategy(),
            refresh_policy = %self.handler.policy(),
            tls = self.tls.is_some(),
            "Query server accepting connections"
        );

        loop {
            let (stream, peer, permit) = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(
                        active_connections = self.tracker.active_count(),
                        "Shutdown signal received, no longer accepting"
                    );
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        continue;
                    }
                },
            };

            let handler = Arc::clone(&self.handler);
            let tls = self.tls.clone();
            let guard = self.tracker.track();

            tokio::spawn(async move {
                let _permit = permit;
                let connection_id = guard.id();
                serve_connection(&handler, tls, stream, peer, connection_id).await;
                drop(guard);
            });
        }

        Ok(())
    }
}

async fn serve_connection(
    handler: &ConnectionHandler,
    tls: Option<TlsAcceptor>,
    stream: TcpStream,
    peer: SocketAddr,
    connection_id: ConnectionId,
) {
    let _ = stream.set_nodelay(true);
    tracing::debug!(connection_id = %connection_id, peer = %peer, "Connection established");

    let reason = match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(mut tls_stream) => serve_stream(handler, &mut tls_stream, connection_id).await,
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, peer = %peer, error = %e, "TLS handshake failed");
                CloseReason::Io
            }
        },
        None => {
            let mut stream = stream;
            serve_stream(handler, &mut stream, connection_id).await
        }
    };

    tracing::debug!(
        connection_id = %connection_id,
        peer = %peer,
        reason = reason.as_str(),
        "Connection closed"
    );
}

async fn serve_stream<S>(handler: &ConnectionHandler, stream: &mut S, connection_id: ConnectionId) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match handler.serve(stream, connection_id).await {
        Ok(()) => CloseReason::Disconnect,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Closing connection");
            e.close_reason()
        }
    }
}
