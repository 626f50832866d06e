// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutation records.
//!
//! A [`Record`] moves through the following states:
//!
//! ```text
//! pending ──► synced
//!    │ ▲
//!    │ └──── failed (manual retry)
//!    ├─────► failed
//!    └─────► conflict ──► pending (keep-local / merge)
//!                    └──► removed (accept-remote)
//! ```
//!
//! `synced` is terminal apart from eviction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::id::RecordId;

/// Mutation body. Opaque to the engine apart from size accounting.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Domain entity a mutation targets. Used only for caller-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Course,
    Attendance,
    Exam,
    File,
    Progress,
    Notice,
}

impl Kind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Course => "course",
            Kind::Attendance => "attendance",
            Kind::Exam => "exam",
            Kind::File => "file",
            Kind::Progress => "progress",
            Kind::Notice => "notice",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "course" => Ok(Kind::Course),
            "attendance" => Ok(Kind::Attendance),
            "exam" => Ok(Kind::Exam),
            "file" => Ok(Kind::File),
            "progress" | "user_progress" => Ok(Kind::Progress),
            "notice" => Ok(Kind::Notice),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Lifecycle state of a queued record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Waiting for the next sync pass.
    Pending,
    /// Accepted by the remote authority.
    Synced,
    /// Remote holds a competing version; needs resolution.
    Conflict,
    /// Retry budget exhausted; excluded from automatic passes.
    Failed,
}

impl RecordState {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordState::Pending => "pending",
            RecordState::Synced => "synced",
            RecordState::Conflict => "conflict",
            RecordState::Failed => "failed",
        }
    }

    /// Returns true if the record still carries unacknowledged work.
    ///
    /// Such records are never evicted.
    pub fn is_unacknowledged(&self) -> bool {
        !matches!(self, RecordState::Synced)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RecordState::Pending),
            "synced" => Ok(RecordState::Synced),
            "conflict" => Ok(RecordState::Conflict),
            "failed" => Ok(RecordState::Failed),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

/// One queued local mutation awaiting reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: Kind,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
    pub state: RecordState,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_snapshot: Option<Payload>,
}

impl Record {
    /// Creates a new pending record.
    pub fn new(
        id: RecordId,
        kind: Kind,
        payload: Payload,
        owner_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Record {
            id,
            kind,
            payload,
            created_at,
            owner_id: owner_id.into(),
            state: RecordState::Pending,
            retry_count: 0,
            last_attempt_at: None,
            remote_snapshot: None,
        }
    }

    /// Remote accepted the mutation.
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.state = RecordState::Synced;
        self.last_attempt_at = Some(at);
        self.remote_snapshot = None;
    }

    /// Remote holds a competing version. The retry count is left alone.
    pub fn mark_conflict(&mut self, remote: Payload, at: DateTime<Utc>) {
        self.state = RecordState::Conflict;
        self.last_attempt_at = Some(at);
        self.remote_snapshot = Some(remote);
    }

    /// Accounts one failed attempt.
    ///
    /// The record becomes `failed` once `retry_count` reaches `max_retries`;
    /// otherwise it stays `pending` for the next pass.
    pub fn record_failure(&mut self, at: DateTime<Utc>, max_retries: u32) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_attempt_at = Some(at);
        self.state = if self.retry_count >= max_retries {
            RecordState::Failed
        } else {
            RecordState::Pending
        };
    }

    /// Returns the record to normal flow with a fresh retry budget.
    pub fn requeue(&mut self) {
        self.state = RecordState::Pending;
        self.retry_count = 0;
        self.remote_snapshot = None;
    }

    /// Size of the record as stored (one JSONL line, newline included).
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(serde_json::to_vec(self)?.len() + 1)
    }
}

/// Caller-side filter for listing records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub kind: Option<Kind>,
    pub owner_id: Option<String>,
    pub state: Option<RecordState>,
}

impl RecordFilter {
    /// Filter matching every record.
    pub fn all() -> Self {
        RecordFilter::default()
    }

    pub fn with_state(state: RecordState) -> Self {
        RecordFilter { state: Some(state), ..Default::default() }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.kind.is_some_and(|k| k != record.kind) {
            return false;
        }
        if self.owner_id.as_deref().is_some_and(|o| o != record.owner_id) {
            return false;
        }
        if self.state.is_some_and(|s| s != record.state) {
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
