// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate status and per-operation reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordState};

/// Snapshot of the queue as seen by status subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub pending_count: usize,
    pub failed_count: usize,
    pub conflict_count: usize,
    pub total_bytes: u64,
}

impl SyncStatus {
    /// Derives a snapshot from the current queue contents.
    pub fn from_records(
        records: &[Record],
        total_bytes: u64,
        is_online: bool,
        last_sync_time: Option<DateTime<Utc>>,
    ) -> Self {
        let count = |state: RecordState| records.iter().filter(|r| r.state == state).count();
        SyncStatus {
            is_online,
            last_sync_time,
            pending_count: count(RecordState::Pending),
            failed_count: count(RecordState::Failed),
            conflict_count: count(RecordState::Conflict),
            total_bytes,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflict_count > 0
    }
}

/// Outcome counts of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub succeeded: usize,
    pub conflicted: usize,
    pub failed: usize,
    /// Pending records left for a later pass.
    pub remaining: usize,
}

impl PassReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.conflicted + self.failed
    }
}

/// Result of a cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub bytes_freed: u64,
}
