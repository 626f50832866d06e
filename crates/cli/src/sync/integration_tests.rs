// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the sync module.
//!
//! These tests wire the engine, scheduler and connectivity together:
//! - Offline queueing followed by an online edge
//! - Config changes while a pass is in flight
//! - Status delivery to subscribers

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::scheduler::Scheduler;
use super::test_helpers::{enqueue_many, open_engine, payload, Behavior, MockRemote};
use syncq_core::{ConfigPatch, Kind, RecordFilter, RecordState, SyncConfig};

/// Records queued offline go out on the next online edge.
#[tokio::test(start_paused = true)]
async fn test_offline_queue_flushes_on_online_edge() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let engine = Arc::new(engine);

    let scheduler = Arc::new(Scheduler::new(Arc::clone(&engine)));
    scheduler.start(Duration::from_secs(60)).await;
    let cancel = CancellationToken::new();
    let watcher = scheduler.watch_connectivity(engine.connectivity_events(), cancel.clone());

    engine.set_online(false);
    enqueue_many(&engine, &clock, 3);
    sleep(Duration::from_millis(10)).await;
    assert!(remote.calls().is_empty());
    assert_eq!(engine.snapshot().pending_count, 3);

    engine.set_online(true);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(remote.calls().len(), 3);
    assert_eq!(engine.snapshot().pending_count, 0);

    cancel.cancel();
    watcher.await.unwrap();
    scheduler.stop().await;
}

/// Ticks while offline are skipped; the next tick online does the work.
#[tokio::test(start_paused = true)]
async fn test_scheduled_ticks_respect_connectivity() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let engine = Arc::new(engine);
    enqueue_many(&engine, &clock, 2);

    let scheduler = Scheduler::new(Arc::clone(&engine));
    engine.set_online(false);
    scheduler.start(Duration::from_millis(100)).await;
    sleep(Duration::from_millis(350)).await;
    assert!(remote.calls().is_empty());

    engine.set_online(true);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(remote.calls().len(), 2);
    scheduler.stop().await;
}

/// A pass keeps the config it started with.
#[tokio::test(start_paused = true)]
async fn test_config_update_does_not_affect_pass_in_flight() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let engine = Arc::new(engine);
    let ids = enqueue_many(&engine, &clock, 3);
    remote.push_for(&ids[0], Behavior::Hang);

    let running = Arc::clone(&engine);
    let pass = tokio::spawn(async move { running.sync_now().await });
    sleep(Duration::from_millis(10)).await;

    engine
        .update_config(&ConfigPatch {
            max_retries: Some(1),
            batch_size: Some(1),
            ..Default::default()
        })
        .unwrap();

    let report = pass.await.unwrap().unwrap();
    assert_eq!(report.attempted(), 3);
    let stalled = engine.get(&ids[0]).unwrap();
    assert_eq!(stalled.retry_count, 1);
    assert_eq!(stalled.state, RecordState::Pending);

    // The next pass sees the new config.
    remote.push_for(&ids[0], Behavior::Fail);
    engine.sync_now().await.unwrap();
    assert_eq!(engine.get(&ids[0]).unwrap().state, RecordState::Failed);
}

/// Enqueue is not blocked behind a pass in flight.
#[tokio::test(start_paused = true)]
async fn test_enqueue_during_pass() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let engine = Arc::new(engine);
    let ids = enqueue_many(&engine, &clock, 1);
    remote.push_for(&ids[0], Behavior::Hang);

    let running = Arc::clone(&engine);
    let pass = tokio::spawn(async move { running.sync_now().await });
    sleep(Duration::from_millis(10)).await;

    let late = engine.enqueue(Kind::Notice, payload(json!({"late": true})), "u2").unwrap();
    assert_eq!(engine.get(&late).unwrap().state, RecordState::Pending);

    let report = pass.await.unwrap().unwrap();
    assert_eq!(report.attempted(), 1);
    assert_eq!(report.remaining, 2);
}

/// Stop requested mid-pass ends it after the record in flight.
#[tokio::test(start_paused = true)]
async fn test_request_stop_mid_pass() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let engine = Arc::new(engine);
    let ids = enqueue_many(&engine, &clock, 3);
    remote.push_for(&ids[0], Behavior::Hang);

    let running = Arc::clone(&engine);
    let pass = tokio::spawn(async move { running.sync_now().await });
    sleep(Duration::from_millis(10)).await;
    engine.request_stop();

    let report = pass.await.unwrap().unwrap();
    assert_eq!(report.attempted(), 1);
    assert_eq!(remote.calls().len(), 1);
    assert_eq!(engine.list(&RecordFilter::with_state(RecordState::Pending)).len(), 3);
}

/// Subscribers see the effect of a pass.
#[tokio::test]
async fn test_subscriber_observes_pass() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Accept), SyncConfig::default());
    enqueue_many(&engine, &clock, 2);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = engine.subscribe_fn(move |s| sink.lock().unwrap().push(s.clone())).unwrap();

    engine.sync_now().await.unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    sleep(Duration::from_millis(20)).await;

    let seen = seen.lock().unwrap();
    let last = seen.last().expect("at least one notification");
    assert_eq!(last.pending_count, 0);
    assert!(last.last_sync_time.is_some());
}
