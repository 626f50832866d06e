// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for forwarding engine operations to `syncq run`.
//!
//! One request and one response per connection, serialized as JSON with
//! length-prefixed framing.

use serde::{Deserialize, Serialize};

use syncq_core::{
    CleanupReport, ConfigPatch, Kind, PassReport, Payload, Record, RecordFilter, RecordId,
    SyncConfig, SyncStatus,
};

use crate::sync::{Resolution, Resolved};

/// Request sent from a CLI process to `syncq run`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Liveness check.
    Ping,
    /// Current status snapshot.
    Status,
    /// Records matching a filter, oldest first.
    List { filter: RecordFilter },
    /// Queue a mutation.
    Enqueue { kind: Kind, owner_id: String, payload: Payload },
    /// Apply a conflict decision.
    Resolve { id: RecordId, resolution: Resolution, payload: Option<Payload> },
    /// Requeue one failed record.
    Retry { id: RecordId },
    /// Requeue every failed record.
    RetryAll,
    /// Remove old synced records.
    Cleanup { older_than_days: u32 },
    /// Effective sync config.
    GetConfig,
    /// Change the sync config.
    UpdateConfig { patch: ConfigPatch },
    /// Run one pass now.
    SyncNow,
}

/// Response sent from `syncq run` to a CLI process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    Pong,
    Status { status: SyncStatus },
    Records { records: Vec<Record> },
    Enqueued { id: RecordId },
    Resolved { resolved: Resolved },
    Retried { record: Record },
    RetriedAll { count: usize },
    Cleanup { report: CleanupReport },
    Config { config: SyncConfig },
    Pass { report: PassReport },
    /// The operation failed; `message` is the engine's error text.
    Error { message: String },
}

/// Maximum message size (64MB). A full listing of a large queue has to fit.
const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

fn too_large(len: usize) -> std::io::Error {
    std::io::Error::other(format!("message too large: {} bytes (max {})", len, MAX_MESSAGE_SIZE))
}

/// Blocking message framing, used by the CLI side.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use std::io::{Read, Write};

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::{too_large, MAX_MESSAGE_SIZE};
    use crate::error::Result;

    /// Write a serializable message to the given writer.
    pub fn write_message<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
        let json = serde_json::to_vec(message)?;
        let len = u32::try_from(json.len()).map_err(|_| too_large(json.len()))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(&json)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a deserializable message from the given reader.
    pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(too_large(len).into());
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(serde_json::from_slice(&buf)?)
    }
}

/// Async message framing, used by `syncq run`. Same wire format as
/// [`framing`].
pub mod framing_async {
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    use super::{too_large, MAX_MESSAGE_SIZE};
    use crate::error::Result;

    pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let json = serde_json::to_vec(message)?;
        let len = u32::try_from(json.len()).map_err(|_| too_large(json.len()))?;
        writer.write_all(&len.to_be_bytes()).await?;
        writer.write_all(&json).await?;
        writer.flush().await?;
        Ok(())
    }

    pub async fn read_message<R, T>(reader: &mut R) -> Result<T>
    where
        R: AsyncRead + Unpin,
        T: DeserializeOwned,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(too_large(len).into());
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;
        Ok(serde_json::from_slice(&buf)?)
    }
}
