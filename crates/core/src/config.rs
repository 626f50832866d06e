// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-tunable sync configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MIN_SYNC_INTERVAL_MS: u64 = 100;

/// Process-wide sync settings, mutable at runtime.
///
/// Missing fields in a stored blob fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Failed attempts after which a record is parked as `failed`.
    pub max_retries: u32,
    /// Scheduler period in milliseconds.
    pub sync_interval_ms: u64,
    /// Maximum records sent per pass.
    pub batch_size: usize,
    /// Ceiling that triggers eviction of synced records.
    pub max_storage_bytes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: 3,
            sync_interval_ms: 30_000,
            batch_size: 10,
            max_storage_bytes: 50 * 1024 * 1024,
        }
    }
}

impl SyncConfig {
    /// Returns a copy with every field set in `patch` replaced.
    pub fn apply(&self, patch: &ConfigPatch) -> SyncConfig {
        SyncConfig {
            max_retries: patch.max_retries.unwrap_or(self.max_retries),
            sync_interval_ms: patch.sync_interval_ms.unwrap_or(self.sync_interval_ms),
            batch_size: patch.batch_size.unwrap_or(self.batch_size),
            max_storage_bytes: patch.max_storage_bytes.unwrap_or(self.max_storage_bytes),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::InvalidConfig("max_retries must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.sync_interval_ms < MIN_SYNC_INTERVAL_MS {
            return Err(Error::InvalidConfig(format!(
                "sync_interval_ms must be at least {MIN_SYNC_INTERVAL_MS}"
            )));
        }
        if self.max_storage_bytes == 0 {
            return Err(Error::InvalidConfig("max_storage_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Size the store is trimmed down to once the ceiling is exceeded.
    pub fn eviction_target_bytes(&self) -> u64 {
        self.max_storage_bytes / 10 * 8
    }
}

/// Partial update for [`SyncConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_storage_bytes: Option<u64>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
