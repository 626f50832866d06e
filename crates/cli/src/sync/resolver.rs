// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution.
//!
//! A record in `conflict` leaves that state only through an explicit
//! decision. The state check and the mutation run under one store lock, so a
//! second resolve of the same record always sees the first one's result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use syncq_core::{Payload, Record, RecordId, RecordState};

use super::queue::QueueStore;
use crate::error::{Error, Result};

/// Caller's decision for a conflicted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Resend the local payload with a fresh retry budget.
    KeepLocal,
    /// Drop the local mutation.
    AcceptRemote,
    /// Resend a caller-supplied payload.
    Merge,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::KeepLocal => "keep-local",
            Resolution::AcceptRemote => "accept-remote",
            Resolution::Merge => "merge",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = syncq_core::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-local" | "keep_local" | "use_local" | "local" => Ok(Resolution::KeepLocal),
            "accept-remote" | "accept_remote" | "use_remote" | "remote" => {
                Ok(Resolution::AcceptRemote)
            }
            "merge" => Ok(Resolution::Merge),
            _ => Err(syncq_core::Error::InvalidResolution(s.to_string())),
        }
    }
}

/// What happened to the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolved {
    /// Back to `pending`, ready for the next pass.
    Requeued(Record),
    /// Removed from the queue.
    Discarded(Record),
}

impl Resolved {
    pub fn record(&self) -> &Record {
        match self {
            Resolved::Requeued(r) | Resolved::Discarded(r) => r,
        }
    }
}

/// Applies `resolution` to a conflicted record.
pub fn resolve(
    store: &QueueStore,
    id: &RecordId,
    resolution: Resolution,
    merged: Option<Payload>,
) -> Result<Resolved> {
    if resolution == Resolution::Merge && merged.is_none() {
        return Err(Error::MergePayloadRequired);
    }

    let resolved = match resolution {
        Resolution::AcceptRemote => Resolved::Discarded(store.take(id, require_conflict)?),
        Resolution::KeepLocal => Resolved::Requeued(store.replace(id, |record| {
            require_conflict(record)?;
            record.requeue();
            Ok(())
        })?),
        Resolution::Merge => Resolved::Requeued(store.replace(id, |record| {
            require_conflict(record)?;
            record.requeue();
            if let Some(payload) = merged {
                record.payload = payload;
            }
            Ok(())
        })?),
    };

    info!(id = %id, resolution = %resolution, "conflict resolved");
    Ok(resolved)
}

fn require_conflict(record: &Record) -> Result<()> {
    if record.state != RecordState::Conflict {
        return Err(Error::InvalidState {
            id: record.id.to_string(),
            state: record.state,
            operation: "resolve",
        });
    }
    Ok(())
}
