// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! EngineHandle abstraction for routing engine operations.
//!
//! When `syncq run` owns the work directory, operations go to it over IPC.
//! Otherwise the command opens the engine itself under the lock.

use std::fs::File;

use syncq_core::{
    CleanupReport, ConfigPatch, Kind, Payload, Record, RecordFilter, RecordId, SyncConfig,
    SyncStatus,
};

use crate::commands::Engine;
use crate::daemon::{DaemonClient, DaemonRequest, DaemonResponse};
use crate::error::{Error, Result};
use crate::sync::{Resolution, Resolved};

/// Handle for engine operations that routes to either a local engine or
/// `syncq run`.
pub enum EngineHandle {
    /// Engine opened by this process. The lock is released on drop.
    Direct { engine: Engine, _lock: File },
    /// Engine owned by `syncq run`.
    Daemon(DaemonClient),
}

fn unexpected() -> Error {
    Error::Runner("unexpected response".to_string())
}

impl EngineHandle {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, EngineHandle::Daemon(_))
    }

    pub fn enqueue(&self, kind: Kind, payload: Payload, owner_id: &str) -> Result<RecordId> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.enqueue(kind, payload, owner_id),
            EngineHandle::Daemon(client) => {
                let request =
                    DaemonRequest::Enqueue { kind, owner_id: owner_id.to_string(), payload };
                match client.request(&request)? {
                    DaemonResponse::Enqueued { id } => Ok(id),
                    _ => Err(unexpected()),
                }
            }
        }
    }

    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        match self {
            EngineHandle::Direct { engine, .. } => Ok(engine.list(filter)),
            EngineHandle::Daemon(client) => {
                match client.request(&DaemonRequest::List { filter: filter.clone() })? {
                    DaemonResponse::Records { records } => Ok(records),
                    _ => Err(unexpected()),
                }
            }
        }
    }

    /// Status snapshot. For a local engine the connectivity flag is whatever
    /// the caller last set.
    pub fn status(&self) -> Result<SyncStatus> {
        match self {
            EngineHandle::Direct { engine, .. } => Ok(engine.snapshot()),
            EngineHandle::Daemon(client) => match client.request(&DaemonRequest::Status)? {
                DaemonResponse::Status { status } => Ok(status),
                _ => Err(unexpected()),
            },
        }
    }

    pub fn resolve(
        &self,
        id: &RecordId,
        resolution: Resolution,
        payload: Option<Payload>,
    ) -> Result<Resolved> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.resolve_conflict(id, resolution, payload),
            EngineHandle::Daemon(client) => {
                let request = DaemonRequest::Resolve { id: id.clone(), resolution, payload };
                match client.request(&request)? {
                    DaemonResponse::Resolved { resolved } => Ok(resolved),
                    _ => Err(unexpected()),
                }
            }
        }
    }

    pub fn retry(&self, id: &RecordId) -> Result<Record> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.retry_failed(id),
            EngineHandle::Daemon(client) => {
                match client.request(&DaemonRequest::Retry { id: id.clone() })? {
                    DaemonResponse::Retried { record } => Ok(record),
                    _ => Err(unexpected()),
                }
            }
        }
    }

    pub fn retry_all(&self) -> Result<usize> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.retry_all_failed(),
            EngineHandle::Daemon(client) => match client.request(&DaemonRequest::RetryAll)? {
                DaemonResponse::RetriedAll { count } => Ok(count),
                _ => Err(unexpected()),
            },
        }
    }

    pub fn cleanup(&self, older_than_days: u32) -> Result<CleanupReport> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.cleanup(older_than_days),
            EngineHandle::Daemon(client) => {
                match client.request(&DaemonRequest::Cleanup { older_than_days })? {
                    DaemonResponse::Cleanup { report } => Ok(report),
                    _ => Err(unexpected()),
                }
            }
        }
    }

    pub fn config(&self) -> Result<SyncConfig> {
        match self {
            EngineHandle::Direct { engine, .. } => Ok(engine.config()),
            EngineHandle::Daemon(client) => match client.request(&DaemonRequest::GetConfig)? {
                DaemonResponse::Config { config } => Ok(config),
                _ => Err(unexpected()),
            },
        }
    }

    pub fn update_config(&self, patch: &ConfigPatch) -> Result<SyncConfig> {
        match self {
            EngineHandle::Direct { engine, .. } => engine.update_config(patch),
            EngineHandle::Daemon(client) => {
                match client.request(&DaemonRequest::UpdateConfig { patch: *patch })? {
                    DaemonResponse::Config { config } => Ok(config),
                    _ => Err(unexpected()),
                }
            }
        }
    }
}
