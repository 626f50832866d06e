// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record identifiers.
//!
//! Format: `rec-{hash}` where hash is the first 16 hex chars of
//! SHA-256(kind + owner + created_at + payload). Collisions get an
//! incrementing `-N` suffix.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::{Kind, Payload};

const ID_PREFIX: &str = "rec";

/// Opaque, immutable identifier of a queued record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wraps an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the base identifier for a mutation.
    pub fn derive(kind: Kind, owner_id: &str, created_at: &DateTime<Utc>, payload: &Payload) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(owner_id.as_bytes());
        hasher.update(created_at.to_rfc3339().as_bytes());
        hasher.update(serde_json::Value::Object(payload.clone()).to_string().as_bytes());
        let hash = hasher.finalize();
        RecordId(format!("{}-{}", ID_PREFIX, hex::encode(&hash[..8])))
    }

    /// Derives an identifier not yet taken according to `exists`.
    pub fn derive_unique<F>(
        kind: Kind,
        owner_id: &str,
        created_at: &DateTime<Utc>,
        payload: &Payload,
        exists: F,
    ) -> Self
    where
        F: Fn(&RecordId) -> bool,
    {
        let base = Self::derive(kind, owner_id, created_at, payload);
        if !exists(&base) {
            return base;
        }

        let mut suffix = 2;
        loop {
            let id = RecordId(format!("{}-{}", base.0, suffix));
            if !exists(&id) {
                return id;
            }
            suffix += 1;
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
