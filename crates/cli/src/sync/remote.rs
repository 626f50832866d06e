// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote authority abstraction.
//!
//! The engine only needs one call: commit a record and learn whether the
//! remote accepted it, holds a competing version, or failed. Everything the
//! remote does to decide that is outside this crate.
//!
//! - [`WebSocketRemote`] speaks the JSON protocol over tokio-tungstenite
//! - tests use a scripted mock implementing [`RemoteAuthority`]

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use syncq_core::protocol::{ClientMessage, ServerMessage};
use syncq_core::{Payload, Record};

/// What the remote said about one commit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Accepted,
    /// The remote holds a competing version.
    Conflict { remote: Payload },
    /// Transient failure: network, rejection, malformed reply.
    Error(String),
}

/// Remote side of a sync pass.
pub trait RemoteAuthority: Send + Sync {
    /// Commits one record. Failures are reported as [`CommitOutcome::Error`],
    /// never as a panic or a hung future on a closed connection.
    fn commit(&mut self, record: &Record)
        -> Pin<Box<dyn Future<Output = CommitOutcome> + Send + '_>>;
}

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

/// WebSocket client for a remote speaking the syncq protocol.
///
/// Connects lazily on the first commit. A broken connection is dropped so
/// the next commit reconnects.
pub struct WebSocketRemote {
    url: String,
    ws: Option<WebSocketConnection>,
}

impl WebSocketRemote {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketRemote { url: url.into(), ws: None }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.ws.is_some()
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.ws.is_some() {
            return Ok(());
        }
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let (sink, stream) = ws_stream.split();
        self.ws = Some(WebSocketConnection { sink, stream });
        debug!(url = %self.url, "connected to remote");
        Ok(())
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), TransportError> {
        let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;
        let json = msg.to_json().map_err(|e| TransportError::SerializationError(e.to_string()))?;

        ws.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        ws.sink.flush().await.map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<ServerMessage, TransportError> {
        let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;
        loop {
            match ws.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return ServerMessage::from_json(&text)
                        .map_err(|e| TransportError::SerializationError(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::ConnectionClosed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn exchange(&mut self, record: &Record) -> Result<CommitOutcome, TransportError> {
        self.connect().await?;
        self.send(&ClientMessage::commit(record)).await?;

        loop {
            let reply = self.recv().await?;
            match reply {
                ServerMessage::Accepted { record_id } if record_id == record.id => {
                    return Ok(CommitOutcome::Accepted);
                }
                ServerMessage::Conflict { record_id, remote } if record_id == record.id => {
                    return Ok(CommitOutcome::Conflict { remote });
                }
                ServerMessage::Rejected { record_id, reason } if record_id == record.id => {
                    return Ok(CommitOutcome::Error(format!("rejected: {reason}")));
                }
                ServerMessage::Error { message } => {
                    return Ok(CommitOutcome::Error(format!("remote error: {message}")));
                }
                other => {
                    debug!(?other, "ignoring unrelated server message");
                }
            }
        }
    }
}

impl RemoteAuthority for WebSocketRemote {
    fn commit(
        &mut self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = CommitOutcome> + Send + '_>> {
        let record = record.clone();
        Box::pin(async move {
            match self.exchange(&record).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.ws = None;
                    CommitOutcome::Error(e.to_string())
                }
            }
        })
    }
}

impl RemoteAuthority for Box<dyn RemoteAuthority> {
    fn commit(
        &mut self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = CommitOutcome> + Send + '_>> {
        (**self).commit(record)
    }
}

/// Remote used when none is configured: every commit fails.
///
/// Lets offline-only work (enqueue, list, resolve) run without a URL.
#[derive(Debug, Default)]
pub struct UnconfiguredRemote;

impl RemoteAuthority for UnconfiguredRemote {
    fn commit(
        &mut self,
        _record: &Record,
    ) -> Pin<Box<dyn Future<Output = CommitOutcome> + Send + '_>> {
        Box::pin(async { CommitOutcome::Error("no remote configured".to_string()) })
    }
}
