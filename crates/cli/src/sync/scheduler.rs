// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pass scheduler.
//!
//! One timer task at a time. `reconfigure` waits for the old task to finish
//! before the new one starts, so two timers never overlap. An immediate
//! trigger (for example on a connectivity online edge) shares the task and
//! therefore never runs concurrently with a tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use syncq_core::SyncConfig;

use super::connectivity::{ConnectivityEvents, Edge};

/// Something the scheduler can run a pass on.
pub trait PassTrigger: Send + Sync + 'static {
    fn trigger_pass(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

struct RunningTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    interval: Duration,
}

/// Periodic driver for sync passes.
pub struct Scheduler<T: PassTrigger> {
    target: Arc<T>,
    timer: Mutex<Option<RunningTimer>>,
    trigger: Arc<Notify>,
}

impl<T: PassTrigger> Scheduler<T> {
    pub fn new(target: Arc<T>) -> Self {
        Scheduler { target, timer: Mutex::new(None), trigger: Arc::new(Notify::new()) }
    }

    /// Starts ticking every `interval`; the first tick comes one full
    /// period from now. Restarts the timer if one is already running.
    pub async fn start(&self, interval: Duration) {
        let mut timer = self.timer.lock().await;
        if let Some(old) = timer.take() {
            shutdown(old).await;
        }
        *timer = Some(self.spawn(interval));
        info!(interval_ms = interval.as_millis() as u64, "scheduler started");
    }

    /// Stops the timer and waits for a pass in flight to finish.
    pub async fn stop(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(old) = timer.take() {
            shutdown(old).await;
            info!("scheduler stopped");
        }
    }

    /// Replaces the period. The old timer is fully stopped first.
    pub async fn reconfigure(&self, interval: Duration) {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|t| t.interval == interval) {
            return;
        }
        if let Some(old) = timer.take() {
            shutdown(old).await;
        }
        *timer = Some(self.spawn(interval));
        info!(interval_ms = interval.as_millis() as u64, "scheduler reconfigured");
    }

    /// Requests one immediate pass. While stopped, the request is kept and
    /// fires as soon as the scheduler starts.
    pub fn trigger_now(&self) {
        self.trigger.notify_one();
    }

    pub async fn is_running(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    pub async fn interval(&self) -> Option<Duration> {
        self.timer.lock().await.as_ref().map(|t| t.interval)
    }

    /// Triggers a pass on every online edge until `cancel` fires.
    pub fn watch_connectivity(
        self: &Arc<Self>,
        mut events: ConnectivityEvents,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let edge = tokio::select! {
                    _ = cancel.cancelled() => break,
                    edge = events.next_edge() => edge,
                };
                match edge {
                    Some(Edge::BecameOnline) => {
                        debug!("online edge, triggering pass");
                        scheduler.trigger_now();
                    }
                    Some(Edge::BecameOffline) => {}
                    None => break,
                }
            }
        })
    }

    /// Reconfigures whenever `sync_interval_ms` changes in `config`.
    pub fn follow_config(
        self: &Arc<Self>,
        mut config: watch::Receiver<SyncConfig>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = config.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let interval = config.borrow_and_update().sync_interval_ms;
                        if scheduler.is_running().await {
                            scheduler.reconfigure(Duration::from_millis(interval)).await;
                        }
                    }
                }
            }
        })
    }

    fn spawn(&self, interval: Duration) -> RunningTimer {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let target = Arc::clone(&self.target);
        let trigger = Arc::clone(&self.trigger);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => debug!("scheduled tick"),
                    _ = trigger.notified() => debug!("immediate trigger"),
                }
                target.trigger_pass().await;
            }
        });

        RunningTimer { cancel, handle, interval }
    }
}

async fn shutdown(timer: RunningTimer) {
    timer.cancel.cancel();
    let _ = timer.handle.await;
}
