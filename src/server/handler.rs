//! Per-connection request loop.
//!
//! # Responsibilities
//! - Decode request frames from one client, strictly in order
//! - Resolve the snapshot under the refresh policy and run the matcher
//! - Encode the verdict token back onto the same stream
//! - Decide when a connection must close
//!
//! The handler is generic over the stream so plain TCP, TLS, and in-memory
//! test pipes share one code path. Dataset reads and scans run on the
//! blocking pool so a slow query never stalls the async workers.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinError;
use uuid::Uuid;

use crate::dataset::{DatasetCache, DatasetError, RefreshPolicy};
use crate::matching::{MatchEngine, MatchOutcome};
use crate::net::{CloseReason, ConnectionId, ConnectionState};
use crate::observability::metrics;
use crate::protocol::{verdict_token, FrameCodec, ProtocolError};

/// Why a connection handler stopped serving.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Dataset unavailable: {0}")]
    Dataset(#[from] DatasetError),

    #[error("No request within {0:?}")]
    IdleTimeout(Duration),

    /// The blocking match task panicked or was cancelled.
    #[error("Match task failed: {0}")]
    Worker(#[from] JoinError),
}

impl HandlerError {
    pub fn close_reason(&self) -> CloseReason {
        match self {
            HandlerError::Protocol(ProtocolError::Io(_)) => CloseReason::Io,
            HandlerError::Protocol(_) => CloseReason::Protocol,
            HandlerError::Dataset(_) => CloseReason::Dataset,
            HandlerError::IdleTimeout(_) => CloseReason::Idle,
            HandlerError::Worker(_) => CloseReason::Internal,
        }
    }
}

/// Serves query frames for one connection at a time.
///
/// Cheap to share: one instance is held behind an `Arc` by the server and
/// used concurrently by every connection task.
#[derive(Debug)]
pub struct ConnectionHandler {
    cache: Arc<DatasetCache>,
    policy: RefreshPolicy,
    engine: MatchEngine,
    codec: FrameCodec,
    malformed_allowance: u32,
    idle_timeout: Option<Duration>,
}

impl ConnectionHandler {
    pub fn new(cache: Arc<DatasetCache>, policy: RefreshPolicy, engine: MatchEngine) -> Self {
        Self {
            cache,
            policy,
            engine,
            codec: FrameCodec::default(),
            malformed_allowance: 0,
            idle_timeout: None,
        }
    }

    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Number of malformed headers tolerated per connection before closing.
    pub fn with_malformed_allowance(mut self, allowance: u32) -> Self {
        self.malformed_allowance = allowance;
        self
    }

    /// Bound the wait for each request header. `None` waits forever.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn engine(&self) -> MatchEngine {
        self.engine
    }

    /// Answer one query against the snapshot selected by the refresh policy.
    ///
    /// Blocks the calling thread for the file read and the scan.
    pub fn answer(&self, query: &str) -> Result<MatchOutcome, DatasetError> {
        answer_with(&self.cache, self.policy, self.engine, query)
    }

    /// Run [`answer`](Self::answer) on the blocking pool.
    ///
    /// The query is handed back alongside the outcome for logging.
    async fn answer_blocking(&self, query: String) -> Result<(String, MatchOutcome), HandlerError> {
        let cache = Arc::clone(&self.cache);
        let (policy, engine) = (self.policy, self.engine);

        let (query, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = answer_with(&cache, policy, engine, &query);
            (query, outcome)
        })
        .await?;

        Ok((query, outcome?))
    }

    /// Serve requests until the peer disconnects or the connection must close.
    ///
    /// `Ok(())` means a clean disconnect at a frame boundary.
    pub async fn serve<S>(&self, stream: &mut S, connection_id: ConnectionId) -> Result<(), HandlerError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut state = ConnectionState::Established;
        let mut malformed = 0u32;

        loop {
            let read = self.codec.read_text(stream);
            let frame = match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, read)
                    .await
                    .map_err(|_| HandlerError::IdleTimeout(limit))?,
                None => read.await,
            };

            let query = match frame {
                Ok(Some(query)) => query,
                Ok(None) => {
                    tracing::trace!(connection_id = %connection_id, ?state, "Peer closed at frame boundary");
                    return Ok(());
                }
                Err(e) if e.is_recoverable() && malformed < self.malformed_allowance => {
                    malformed += 1;
                    metrics::record_protocol_error(e.kind());
                    tracing::warn!(
                        connection_id = %connection_id,
                        error = %e,
                        malformed,
                        allowance = self.malformed_allowance,
                        "Skipping malformed frame"
                    );
                    continue;
                }
                Err(e) => {
                    metrics::record_protocol_error(e.kind());
                    return Err(e.into());
                }
            };

            state = ConnectionState::Serving;
            let request_id = Uuid::new_v4();
            let (query, outcome) = self.answer_blocking(query).await?;

            metrics::record_query(outcome.verdict, self.engine.strategy(), outcome.elapsed);
            tracing::debug!(
                request_id = %request_id,
                connection_id = %connection_id,
                query = ?query,
                verdict = outcome.verdict.as_str(),
                strategy = %self.engine.strategy(),
                elapsed = %outcome.elapsed_display(),
                timestamp = %outcome.timestamp_display(),
                "Query answered"
            );

            self.codec
                .write_frame(stream, verdict_token(outcome.verdict).as_bytes())
                .await?;
        }
    }
}

fn answer_with(
    cache: &DatasetCache,
    policy: RefreshPolicy,
    engine: MatchEngine,
    query: &str,
) -> Result<MatchOutcome, DatasetError> {
    let snapshot = cache.resolve(policy)?;
    Ok(engine.run(query, &snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetSource, FileSource};
    use crate::matching::{Strategy, Verdict};
    use crate::protocol::frame::{encode_frame, HEADER_WIDTH};
    use crate::protocol::{parse_verdict, FOUND_TOKEN, NOT_FOUND_TOKEN};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    fn dataset(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn handler(file: &NamedTempFile, policy: RefreshPolicy) -> ConnectionHandler {
        let cache = Arc::new(DatasetCache::new(Arc::new(FileSource::new(file.path()))));
        ConnectionHandler::new(cache, policy, MatchEngine::new(Strategy::Linear))
    }

    fn spawn(handler: ConnectionHandler) -> (DuplexStream, JoinHandle<Result<(), HandlerError>>) {
        let (client, mut server) = duplex(64 * 1024);
        let task = tokio::spawn(async move { handler.serve(&mut server, ConnectionId::new()).await });
        (client, task)
    }

    async fn ask(client: &mut DuplexStream, query: &str) -> Option<Verdict> {
        let codec = FrameCodec::default();
        codec.write_frame(client, query.as_bytes()).await.unwrap();
        codec
            .read_text(client)
            .await
            .unwrap()
            .and_then(|token| parse_verdict(&token))
    }

    #[tokio::test]
    async fn answers_queries_in_order() {
        let file = dataset("alpha\nbeta\ngamma\n");
        let (mut client, task) = spawn(handler(&file, RefreshPolicy::Lazy));

        assert_eq!(ask(&mut client, "beta").await, Some(Verdict::Found));
        assert_eq!(ask(&mut client, "delta").await, Some(Verdict::NotFound));
        assert_eq!(ask(&mut client, "bet").await, Some(Verdict::NotFound));
        assert_eq!(ask(&mut client, "  gamma\n").await, Some(Verdict::Found));

        drop(client);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn responds_with_exact_tokens() {
        let file = dataset("x\n");
        let (mut client, _task) = spawn(handler(&file, RefreshPolicy::Lazy));
        let codec = FrameCodec::default();

        codec.write_frame(&mut client, b"x").await.unwrap();
        assert_eq!(codec.read_text(&mut client).await.unwrap().unwrap(), FOUND_TOKEN);
        codec.write_frame(&mut client, b"y").await.unwrap();
        assert_eq!(codec.read_text(&mut client).await.unwrap().unwrap(), NOT_FOUND_TOKEN);
    }

    #[tokio::test]
    async fn lazy_keeps_first_snapshot_and_always_rereads() {
        let mut file = dataset("A\nB\nC\n");
        let (mut lazy, _lazy_task) = spawn(handler(&file, RefreshPolicy::Lazy));
        let (mut always, _always_task) = spawn(handler(&file, RefreshPolicy::Always));

        assert_eq!(ask(&mut lazy, "B").await, Some(Verdict::Found));
        assert_eq!(ask(&mut always, "X").await, Some(Verdict::NotFound));

        file.write_all(b"X\n").unwrap();
        file.flush().unwrap();

        assert_eq!(ask(&mut lazy, "X").await, Some(Verdict::NotFound));
        assert_eq!(ask(&mut always, "X").await, Some(Verdict::Found));
    }

    #[tokio::test]
    async fn malformed_header_closes_by_default() {
        let file = dataset("a\n");
        let (mut client, task) = spawn(handler(&file, RefreshPolicy::Lazy));

        let mut header = vec![b'\n'; HEADER_WIDTH];
        header[..3].copy_from_slice(b"abc");
        client.write_all(&header).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, HandlerError::Protocol(ProtocolError::InvalidHeader { .. })));
        assert_eq!(err.close_reason(), CloseReason::Protocol);
    }

    #[tokio::test]
    async fn malformed_header_within_allowance_is_skipped() {
        let file = dataset("a\n");
        let (mut client, _task) = spawn(handler(&file, RefreshPolicy::Lazy).with_malformed_allowance(1));

        client.write_all(&[b'?'; HEADER_WIDTH]).await.unwrap();
        assert_eq!(ask(&mut client, "a").await, Some(Verdict::Found));
    }

    #[tokio::test]
    async fn oversized_payload_closes_connection() {
        let file = dataset("a\n");
        let (mut client, task) = spawn(handler(&file, RefreshPolicy::Lazy).with_codec(FrameCodec::new(8)));

        client.write_all(&encode_frame(b"way past eight bytes")).await.unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Protocol(ProtocolError::PayloadTooLarge { declared: 20, max: 8 })
        ));
    }

    #[tokio::test]
    async fn missing_dataset_closes_connection() {
        let file = dataset("a\n");
        let handler = handler(&file, RefreshPolicy::Always);
        drop(file);

        let (mut client, task) = spawn(handler);
        assert_eq!(ask(&mut client, "a").await, None);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, HandlerError::Dataset(DatasetError::FileAccess { .. })));
        assert_eq!(err.close_reason(), CloseReason::Dataset);
    }

    /// Source whose every load takes `delay`.
    #[derive(Debug)]
    struct SlowSource {
        text: &'static str,
        delay: Duration,
    }

    impl DatasetSource for SlowSource {
        fn load(&self) -> Result<String, DatasetError> {
            std::thread::sleep(self.delay);
            Ok(self.text.to_string())
        }

        fn describe(&self) -> String {
            "slow".into()
        }
    }

    // Single-threaded runtime: a scan on the async worker would stall every task.
    #[tokio::test(flavor = "current_thread")]
    async fn slow_reload_does_not_stall_other_connections() {
        let slow_cache = Arc::new(DatasetCache::new(Arc::new(SlowSource {
            text: "big\n",
            delay: Duration::from_millis(1500),
        })));
        let slow = ConnectionHandler::new(slow_cache, RefreshPolicy::Always, MatchEngine::default());
        let (mut slow_client, _slow_task) = spawn(slow);

        let file = dataset("a\n");
        let (mut fast_client, _fast_task) = spawn(handler(&file, RefreshPolicy::Lazy));
        assert_eq!(ask(&mut fast_client, "a").await, Some(Verdict::Found));

        let slow_query = tokio::spawn(async move { ask(&mut slow_client, "big").await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let fast = tokio::time::timeout(Duration::from_millis(700), ask(&mut fast_client, "a")).await;
        assert_eq!(fast.ok().flatten(), Some(Verdict::Found));
        assert_eq!(slow_query.await.unwrap(), Some(Verdict::Found));
    }

    #[tokio::test]
    async fn idle_connection_times_out() {
        let file = dataset("a\n");
        let limit = Duration::from_millis(50);
        let (_client, task) = spawn(handler(&file, RefreshPolicy::Lazy).with_idle_timeout(Some(limit)));

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, HandlerError::IdleTimeout(d) if d == limit));
    }
}
