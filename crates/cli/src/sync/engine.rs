// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine.
//!
//! Owns the queue store, the side state and the remote, and runs bounded
//! sync passes over them:
//!
//! 1. refuse when offline
//! 2. take up to `batch_size` pending records, oldest first
//! 3. commit each one in turn, under a timeout
//! 4. fold the outcome into the record (synced, conflict, or one more retry)
//! 5. stop at the end of the batch, record `last_sync_time`, publish
//!
//! Remote failures never leave a pass as errors; they only show up in record
//! state and in the [`PassReport`].

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use syncq_core::{
    CleanupReport, ClockSource, ConfigPatch, Kind, PassReport, Payload, Record, RecordFilter,
    RecordId, RecordState, SyncConfig, SyncStatus, SystemClock,
};

use super::connectivity::{Connectivity, ConnectivityEvents, Edge};
use super::persist::SideState;
use super::queue::{QueueStore, QUEUE_FILE};
use super::remote::{CommitOutcome, RemoteAuthority};
use super::resolver::{self, Resolution, Resolved};
use super::scheduler::PassTrigger;
use super::status::{StatusPublisher, Subscription};
use crate::error::{Error, Result};

/// Default age, in days, past which synced records are cleaned up.
pub const DEFAULT_CLEANUP_DAYS: u32 = 30;

/// Engine tunables that are not part of the persisted [`SyncConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound on one remote commit.
    pub commit_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions { commit_timeout: Duration::from_secs(10) }
    }
}

/// Offline-first sync engine for one work directory.
pub struct SyncEngine<R: RemoteAuthority, C: ClockSource = SystemClock> {
    store: QueueStore,
    side: SideState,
    connectivity: Arc<Connectivity>,
    publisher: Arc<StatusPublisher>,
    remote: Mutex<R>,
    clock: C,
    config: watch::Sender<SyncConfig>,
    options: EngineOptions,
    stop_requested: AtomicBool,
}

impl<R: RemoteAuthority, C: ClockSource> SyncEngine<R, C> {
    /// Opens the engine over the files in `dir`.
    ///
    /// The stored config blob wins over `seed`; `seed` applies only when no
    /// valid blob exists. A damaged queue or side file is reported and
    /// replaced by its empty or default value.
    pub fn open(
        dir: &Path,
        remote: R,
        clock: C,
        options: EngineOptions,
        seed: SyncConfig,
    ) -> Result<Self> {
        seed.validate()?;
        let side = SideState::new(dir);
        let config = side.load_config().unwrap_or(seed);
        let last_sync_time = side.load_last_sync();

        let connectivity = Arc::new(Connectivity::new());
        let publisher = Arc::new(StatusPublisher::new(SyncStatus {
            is_online: connectivity.is_online(),
            last_sync_time,
            ..SyncStatus::default()
        }));
        let store = QueueStore::open(&dir.join(QUEUE_FILE), Arc::clone(&publisher))?;
        let (config, _) = watch::channel(config);

        Ok(SyncEngine {
            store,
            side,
            connectivity,
            publisher,
            remote: Mutex::new(remote),
            clock,
            config,
            options,
            stop_requested: AtomicBool::new(false),
        })
    }

    /// Queues a mutation. Durable once this returns.
    pub fn enqueue(&self, kind: Kind, payload: Payload, owner_id: &str) -> Result<RecordId> {
        let record = self.store.insert_new(kind, payload, owner_id, self.clock.now())?;
        debug!(id = %record.id, kind = %record.kind, owner = %record.owner_id, "enqueued");

        // The record is already on disk; an eviction problem must not turn
        // the acknowledgement into a failure.
        if let Err(e) = self.enforce_storage_limit() {
            warn!(error = %e, "storage eviction failed");
        }
        Ok(record.id)
    }

    pub fn list(&self, filter: &RecordFilter) -> Vec<Record> {
        self.store.list_all(filter)
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.store.get(id)
    }

    /// Runs one pass now. Fails with [`Error::Offline`] when offline.
    pub async fn sync_now(&self) -> Result<PassReport> {
        if !self.connectivity.is_online() {
            return Err(Error::Offline);
        }
        self.run_pass().await
    }

    /// Runs one pass if online. Offline ticks are skipped without error.
    pub async fn run_scheduled_pass(&self) -> Option<PassReport> {
        if !self.connectivity.is_online() {
            debug!("offline, skipping scheduled pass");
            return None;
        }
        match self.run_pass().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "scheduled pass failed");
                None
            }
        }
    }

    /// Asks the running pass to stop after the record in flight.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    async fn run_pass(&self) -> Result<PassReport> {
        let mut remote = self.remote.lock().await;
        self.stop_requested.store(false, Ordering::SeqCst);

        let config = *self.config.borrow();
        let batch = self.store.oldest_pending(config.batch_size);
        let mut report = PassReport::default();

        for record in batch {
            if self.stop_requested.load(Ordering::SeqCst) {
                info!("stop requested, ending pass early");
                break;
            }
            if !self.connectivity.is_online() {
                info!("went offline, ending pass early");
                break;
            }

            let outcome =
                match tokio::time::timeout(self.options.commit_timeout, remote.commit(&record))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => CommitOutcome::Error(format!(
                        "commit timed out after {}ms",
                        self.options.commit_timeout.as_millis()
                    )),
                };

            let now = self.clock.now();
            let updated = self.store.replace(&record.id, |stored| {
                if stored.state != RecordState::Pending {
                    return Err(Error::InvalidState {
                        id: stored.id.to_string(),
                        state: stored.state,
                        operation: "sync",
                    });
                }
                match &outcome {
                    CommitOutcome::Accepted => stored.mark_synced(now),
                    CommitOutcome::Conflict { remote } => stored.mark_conflict(remote.clone(), now),
                    CommitOutcome::Error(_) => stored.record_failure(now, config.max_retries),
                }
                Ok(())
            });

            match (updated, &outcome) {
                (Ok(_), CommitOutcome::Accepted) => {
                    debug!(id = %record.id, "accepted");
                    report.succeeded += 1;
                }
                (Ok(_), CommitOutcome::Conflict { .. }) => {
                    debug!(id = %record.id, "conflict");
                    report.conflicted += 1;
                }
                (Ok(stored), CommitOutcome::Error(reason)) => {
                    debug!(
                        id = %record.id,
                        retry_count = stored.retry_count,
                        state = %stored.state,
                        reason = %reason,
                        "commit failed"
                    );
                    report.failed += 1;
                }
                (Err(e @ (Error::InvalidState { .. } | Error::RecordNotFound(_))), _) => {
                    warn!(id = %record.id, error = %e, "record changed during pass, outcome dropped");
                }
                (Err(e), _) => return Err(e),
            }
        }

        report.remaining = self.store.list_all(&RecordFilter::with_state(RecordState::Pending)).len();
        let finished = self.clock.now();
        if let Err(e) = self.side.save_last_sync(finished) {
            warn!(error = %e, "cannot persist last sync time");
        }
        self.publisher.set_last_sync(finished);

        info!(
            succeeded = report.succeeded,
            conflicted = report.conflicted,
            failed = report.failed,
            remaining = report.remaining,
            "sync pass complete"
        );
        Ok(report)
    }

    /// Applies a conflict decision.
    pub fn resolve_conflict(
        &self,
        id: &RecordId,
        resolution: Resolution,
        merged: Option<Payload>,
    ) -> Result<Resolved> {
        resolver::resolve(&self.store, id, resolution, merged)
    }

    /// Returns a failed record to `pending` with a fresh retry budget.
    pub fn retry_failed(&self, id: &RecordId) -> Result<Record> {
        let record = self.store.replace(id, |record| {
            if record.state != RecordState::Failed {
                return Err(Error::InvalidState {
                    id: record.id.to_string(),
                    state: record.state,
                    operation: "retry",
                });
            }
            record.requeue();
            Ok(())
        })?;
        info!(id = %id, "failed record requeued");
        Ok(record)
    }

    /// Requeues every failed record. Returns how many were requeued.
    pub fn retry_all_failed(&self) -> Result<usize> {
        let failed = self.store.list_all(&RecordFilter::with_state(RecordState::Failed));
        let mut count = 0;
        for record in failed {
            match self.retry_failed(&record.id) {
                Ok(_) => count += 1,
                Err(Error::InvalidState { .. } | Error::RecordNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(count)
    }

    /// Removes synced records created more than `older_than_days` ago.
    pub fn cleanup(&self, older_than_days: u32) -> Result<CleanupReport> {
        let cutoff = chrono::TimeDelta::try_days(i64::from(older_than_days))
            .and_then(|age| self.clock.now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            debug!(older_than_days, "cutoff predates the calendar, nothing to clean up");
            return Ok(CleanupReport::default());
        };
        let removed = self
            .store
            .remove_where(|r| r.state == RecordState::Synced && r.created_at < cutoff)?;

        let mut bytes_freed = 0u64;
        for record in &removed {
            bytes_freed += record.encoded_len()? as u64;
        }
        info!(removed = removed.len(), bytes_freed, older_than_days, "cleanup complete");
        Ok(CleanupReport { removed: removed.len(), bytes_freed })
    }

    /// Validates and persists a config change. Passes already running keep
    /// the config they started with.
    pub fn update_config(&self, patch: &ConfigPatch) -> Result<SyncConfig> {
        let next = self.config().apply(patch);
        next.validate()?;
        self.side.save_config(&next)?;
        self.config.send_replace(next);
        info!(?next, "sync config updated");

        if let Err(e) = self.enforce_storage_limit() {
            warn!(error = %e, "storage eviction failed");
        }
        Ok(next)
    }

    pub fn config(&self) -> SyncConfig {
        *self.config.borrow()
    }

    /// Receiver notified on every config update.
    pub fn config_watch(&self) -> watch::Receiver<SyncConfig> {
        self.config.subscribe()
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Feeds the host connectivity signal.
    pub fn set_online(&self, online: bool) -> Option<Edge> {
        let edge = self.connectivity.set_online(online);
        self.publisher.set_online(online);
        edge
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn connectivity_events(&self) -> ConnectivityEvents {
        self.connectivity.subscribe()
    }

    pub fn snapshot(&self) -> SyncStatus {
        self.publisher.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.publisher.subscribe()
    }

    /// Calls `callback` on every status change until unsubscribed.
    ///
    /// Fails with [`Error::NoRuntime`] outside a tokio runtime.
    pub fn subscribe_fn<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(&SyncStatus) + Send + 'static,
    {
        self.publisher.subscribe_fn(callback)
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    fn enforce_storage_limit(&self) -> Result<()> {
        let config = self.config();
        if self.store.size_bytes() <= config.max_storage_bytes {
            return Ok(());
        }

        let report = self.store.evict_synced(config.eviction_target_bytes())?;
        if report.removed > 0 {
            info!(
                removed = report.removed,
                bytes_freed = report.bytes_freed,
                "evicted synced records under storage pressure"
            );
        }
        let size = self.store.size_bytes();
        if size > config.max_storage_bytes {
            warn!(
                size,
                limit = config.max_storage_bytes,
                "storage limit exceeded by unsynced records"
            );
        }
        Ok(())
    }
}

impl<R, C> PassTrigger for SyncEngine<R, C>
where
    R: RemoteAuthority + 'static,
    C: ClockSource + 'static,
{
    fn trigger_pass(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.run_scheduled_pass().await;
        })
    }
}
