// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between the engine and a remote authority.
//!
//! The protocol is commit-or-conflict:
//! - Client submits one record per `Commit`
//! - Server answers with `Accepted`, `Conflict` (carrying its version), or
//!   `Rejected`, echoing the record ID

use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::record::{Kind, Payload, Record};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a queued mutation.
    Commit {
        record_id: RecordId,
        kind: Kind,
        owner_id: String,
        payload: Payload,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The mutation was committed.
    Accepted { record_id: RecordId },

    /// The server holds a competing version of the entity.
    Conflict {
        record_id: RecordId,
        /// The server's current representation.
        remote: Payload,
    },

    /// The server refused the mutation; the client may retry later.
    Rejected { record_id: RecordId, reason: String },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error not tied to a specific record.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Commit message for a record.
    pub fn commit(record: &Record) -> Self {
        ClientMessage::Commit {
            record_id: record.id.clone(),
            kind: record.kind,
            owner_id: record.owner_id.clone(),
            payload: record.payload.clone(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn accepted(record_id: RecordId) -> Self {
        ServerMessage::Accepted { record_id }
    }

    pub fn conflict(record_id: RecordId, remote: Payload) -> Self {
        ServerMessage::Conflict { record_id, remote }
    }

    pub fn rejected(record_id: RecordId, reason: impl Into<String>) -> Self {
        ServerMessage::Rejected { record_id, reason: reason.into() }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// Returns the record this message answers, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            ServerMessage::Accepted { record_id }
            | ServerMessage::Conflict { record_id, .. }
            | ServerMessage::Rejected { record_id, .. } => Some(record_id),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
