// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use syncq_core::RecordState;

/// All possible errors that can occur in the syncq library.
///
/// Remote commit failures are not represented here: the engine absorbs them
/// into record state. Only structural misuse and local I/O surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'syncq init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("offline: cannot sync while the remote is unreachable\n  hint: retry once connectivity is restored")]
    Offline,

    #[error("cannot {operation} record {id}: it is {state}")]
    InvalidState {
        id: String,
        state: RecordState,
        operation: &'static str,
    },

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("duplicate record id: {0}")]
    DuplicateRecord(String),

    #[error("merge resolution requires a merged payload\n  hint: pass --payload '<json object>'")]
    MergePayloadRequired,

    #[error("payload must be a JSON object")]
    PayloadNotObject,

    #[error("no remote configured\n  hint: set remote_url in .syncq/config.toml or SYNCQ_REMOTE_URL")]
    NoRemote,

    #[error("invalid remote url '{0}'\n  hint: expected ws://host[:port][/path] or wss://...")]
    InvalidRemoteUrl(String),

    #[error("store is locked by another syncq process\n  hint: wait for the other syncq command to finish, then retry")]
    StoreLocked,

    #[error("no async runtime: status callbacks must be registered from within tokio")]
    NoRuntime,

    #[error("syncq run: {0}")]
    Runner(String),

    /// An error reported by `syncq run` for a forwarded request.
    #[error("{0}")]
    Forwarded(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error(transparent)]
    Core(syncq_core::Error),
}

/// A specialized Result type for syncq operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<syncq_core::Error> for Error {
    fn from(e: syncq_core::Error) -> Self {
        match e {
            syncq_core::Error::Io(e) => Error::Io(e),
            syncq_core::Error::Json(e) => Error::Json(e),
            syncq_core::Error::CorruptedData(s) => Error::CorruptedData(s),
            syncq_core::Error::InvalidConfig(s) => Error::Config(s),
            other => Error::Core(other),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
