// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status publisher.
//!
//! Holds the aggregate [`SyncStatus`] in a `tokio::sync::watch` channel.
//! Rapid updates coalesce into the latest value; the latest value is never
//! lost. Callback subscribers run on their own task, so subscribing or
//! unsubscribing from inside a callback cannot disturb delivery to others.

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use syncq_core::{Record, SyncStatus};

use crate::error::{Error, Result};

/// Broadcasts status snapshots to observers.
pub struct StatusPublisher {
    tx: watch::Sender<SyncStatus>,
}

impl StatusPublisher {
    pub fn new(initial: SyncStatus) -> Self {
        let (tx, _) = watch::channel(initial);
        StatusPublisher { tx }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every committed update (coalesced).
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Invokes `callback` with each new snapshot until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    ///
    /// The delivery task runs on the current tokio runtime; without one this
    /// fails with [`Error::NoRuntime`].
    pub fn subscribe_fn<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(&SyncStatus) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let mut rx = self.tx.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let status = rx.borrow_and_update().clone();
                        if token.is_cancelled() {
                            break;
                        }
                        callback(&status);
                    }
                }
            }
        });

        Ok(Subscription { cancel })
    }

    /// Replaces the whole snapshot. Never fails, even without receivers.
    pub fn publish(&self, status: SyncStatus) {
        self.tx.send_replace(status);
    }

    /// Recomputes the queue-derived fields.
    pub(crate) fn update_queue(&self, records: &[Record], total_bytes: u64) {
        self.tx.send_if_modified(|status| {
            let next = SyncStatus::from_records(
                records,
                total_bytes,
                status.is_online,
                status.last_sync_time,
            );
            let changed = next != *status;
            *status = next;
            changed
        });
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|status| {
            let changed = status.is_online != online;
            status.is_online = online;
            changed
        });
    }

    pub(crate) fn set_last_sync(&self, at: DateTime<Utc>) {
        self.tx.send_modify(|status| status.last_sync_time = Some(at));
    }
}

/// Handle for a callback subscription.
///
/// Unsubscribing is idempotent and may happen from inside the callback via
/// an [`Unsubscriber`]. Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cloneable handle that can be moved into the callback.
    pub fn unsubscriber(&self) -> Unsubscriber {
        Unsubscriber { cancel: self.cancel.clone() }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Detached unsubscribe handle.
#[derive(Debug, Clone)]
pub struct Unsubscriber {
    cancel: CancellationToken,
}

impl Unsubscriber {
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }
}
