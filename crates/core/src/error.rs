// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for syncq-core operations.

use thiserror::Error;

/// All possible errors that can occur in syncq-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid record kind: '{0}'\n  hint: valid kinds are: course, attendance, exam, file, progress, notice")]
    InvalidKind(String),

    #[error("invalid record state: '{0}'\n  hint: valid states are: pending, synced, conflict, failed")]
    InvalidState(String),

    #[error("invalid resolution: '{0}'\n  hint: valid resolutions are: keep-local, accept-remote, merge")]
    InvalidResolution(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for syncq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
