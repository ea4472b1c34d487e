//! Query client.
//!
//! Speaks the same framing as the server: one request frame carrying the
//! query, one response frame carrying the verdict token.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::matching::Verdict;
use crate::net::tls::{self, TlsError};
use crate::protocol::{parse_verdict, FrameCodec, ProtocolError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Server closed the connection instead of answering.
    #[error("Server closed the connection")]
    Disconnected,

    #[error("Unexpected response: {0:?}")]
    UnexpectedResponse(String),
}

/// A connection to a query server.
#[derive(Debug)]
pub struct QueryClient<S> {
    stream: S,
    codec: FrameCodec,
}

impl QueryClient<TcpStream> {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl QueryClient<TlsStream<TcpStream>> {
    /// Connect and complete a TLS handshake, verifying `server_name`.
    pub async fn connect_tls(
        addr: impl ToSocketAddrs,
        connector: &TlsConnector,
        server_name: &str,
    ) -> Result<Self, ClientError> {
        let name = tls::server_name(server_name)?;
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let stream = connector.connect(name, stream).await?;
        Ok(Self::new(stream))
    }
}

impl<S> QueryClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: FrameCodec::default(),
        }
    }

    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Send one query and wait for its verdict.
    pub async fn query(&mut self, query: &str) -> Result<Verdict, ClientError> {
        self.codec.write_frame(&mut self.stream, query.as_bytes()).await?;

        let token = self
            .codec
            .read_text(&mut self.stream)
            .await?
            .ok_or(ClientError::Disconnected)?;

        parse_verdict(&token).ok_or(ClientError::UnexpectedResponse(token))
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FOUND_TOKEN, NOT_FOUND_TOKEN};
    use tokio::io::duplex;

    #[tokio::test]
    async fn parses_verdicts() {
        let (client_side, mut server_side) = duplex(4096);
        let server = tokio::spawn(async move {
            let codec = FrameCodec::default();
            while let Some(query) = codec.read_text(&mut server_side).await.unwrap() {
                let token = if query == "yes" { FOUND_TOKEN } else { NOT_FOUND_TOKEN };
                codec.write_frame(&mut server_side, token.as_bytes()).await.unwrap();
            }
        });

        let mut client = QueryClient::new(client_side);
        assert_eq!(client.query("yes").await.unwrap(), Verdict::Found);
        assert_eq!(client.query("no").await.unwrap(), Verdict::NotFound);

        drop(client);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn reports_disconnect_and_garbage() {
        let (client_side, mut server_side) = duplex(4096);
        tokio::spawn(async move {
            let codec = FrameCodec::default();
            codec.read_text(&mut server_side).await.unwrap();
            codec.write_frame(&mut server_side, b"MAYBE\n").await.unwrap();
            codec.read_text(&mut server_side).await.unwrap();
        });

        let mut client = QueryClient::new(client_side);
        assert!(matches!(
            client.query("first").await,
            Err(ClientError::UnexpectedResponse(ref token)) if token == "MAYBE\n"
        ));
        assert!(matches!(client.query("second").await, Err(ClientError::Disconnected)));
    }
}
