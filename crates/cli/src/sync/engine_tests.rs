// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync engine.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashSet;

use serde_json::json;
use tempfile::tempdir;
use yare::parameterized;

use super::connectivity::Edge;
use super::resolver::Resolution;
use super::test_helpers::{enqueue_many, make_record, open_engine, payload, t0, Behavior, MockRemote};
use crate::error::Error;
use syncq_core::{ConfigPatch, Kind, RecordFilter, RecordId, RecordState, SyncConfig};

fn config(max_retries: u32, batch_size: usize) -> SyncConfig {
    SyncConfig { max_retries, batch_size, ..SyncConfig::default() }
}

#[test]
fn test_enqueue_is_durable_and_listed() {
    let dir = tempdir().unwrap();
    let id = {
        let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
        engine.enqueue(Kind::Course, payload(json!({"title": "Algebra"})), "u1").unwrap()
    };

    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    let records = engine.list(&RecordFilter::all());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].state, RecordState::Pending);
    assert_eq!(records[0].retry_count, 0);
    assert_eq!(records[0].created_at, t0());
}

#[test]
fn test_enqueued_ids_are_unique() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());

    // Same clock instant, same input: ids must still differ.
    let ids: Vec<RecordId> = (0..20)
        .map(|_| engine.enqueue(Kind::Notice, payload(json!({"x": 1})), "u1").unwrap())
        .collect();
    let unique: HashSet<&RecordId> = ids.iter().collect();
    assert_eq!(unique.len(), 20);
    assert_eq!(engine.list(&RecordFilter::all()).len(), 20);
}

// Scenario A
#[tokio::test]
async fn test_all_accepted() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Accept), SyncConfig::default());
    enqueue_many(&engine, &clock, 3);

    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.remaining, 0);

    let status = engine.snapshot();
    assert_eq!(status.pending_count, 0);
    assert_eq!(status.failed_count, 0);
    assert_eq!(engine.list(&RecordFilter::with_state(RecordState::Synced)).len(), 3);
    assert!(engine.list(&RecordFilter::all()).iter().all(|r| r.last_attempt_at.is_some()));
}

// Scenario B
#[tokio::test]
async fn test_conflict_then_merge_then_accept() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, _) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let id = engine.enqueue(Kind::Exam, payload(json!({"field": "local"})), "u1").unwrap();
    remote.push_for(&id, Behavior::Conflict(payload(json!({"field": "remote"}))));

    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.conflicted, 1);
    let record = engine.get(&id).unwrap();
    assert_eq!(record.state, RecordState::Conflict);
    assert_eq!(record.remote_snapshot, Some(payload(json!({"field": "remote"}))));
    assert_eq!(record.retry_count, 0);
    assert_eq!(engine.snapshot().conflict_count, 1);

    engine.resolve_conflict(&id, Resolution::Merge, Some(payload(json!({"field": "x"})))).unwrap();
    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.succeeded, 1);

    let record = engine.get(&id).unwrap();
    assert_eq!(record.state, RecordState::Synced);
    assert_eq!(record.payload, payload(json!({"field": "x"})));
    assert_eq!(remote.calls().last().unwrap().payload, payload(json!({"field": "x"})));
}

// Scenario C
#[tokio::test]
async fn test_failures_park_record_at_max_retries() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Fail);
    let (engine, _) = open_engine(dir.path(), remote.clone(), config(2, 10));
    let id = engine.enqueue(Kind::Attendance, payload(json!({})), "u1").unwrap();

    let first = engine.sync_now().await.unwrap();
    assert_eq!(first.failed, 1);
    let record = engine.get(&id).unwrap();
    assert_eq!(record.state, RecordState::Pending);
    assert_eq!(record.retry_count, 1);

    engine.sync_now().await.unwrap();
    let record = engine.get(&id).unwrap();
    assert_eq!(record.state, RecordState::Failed);
    assert_eq!(record.retry_count, 2);

    let third = engine.sync_now().await.unwrap();
    assert_eq!(third.attempted(), 0);
    let record = engine.get(&id).unwrap();
    assert_eq!(record.state, RecordState::Failed);
    assert_eq!(record.retry_count, 2);
    assert_eq!(remote.calls().len(), 2);
    assert_eq!(engine.snapshot().failed_count, 1);
}

// Scenario D
#[tokio::test]
async fn test_sync_now_offline_is_rejected_without_changes() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    enqueue_many(&engine, &clock, 2);
    let before = engine.list(&RecordFilter::all());

    engine.set_online(false);
    let err = engine.sync_now().await.unwrap_err();
    assert!(matches!(err, Error::Offline));
    assert_eq!(engine.list(&RecordFilter::all()), before);
    assert!(remote.calls().is_empty());
    assert!(engine.snapshot().last_sync_time.is_none());
    assert!(!engine.snapshot().is_online);
}

#[tokio::test]
async fn test_scheduled_pass_skips_silently_offline() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Accept), SyncConfig::default());
    enqueue_many(&engine, &clock, 1);

    engine.set_online(false);
    assert!(engine.run_scheduled_pass().await.is_none());

    engine.set_online(true);
    let report = engine.run_scheduled_pass().await.unwrap();
    assert_eq!(report.succeeded, 1);
}

#[test]
fn test_online_flips_reach_the_status_snapshot() {
    let dir = tempdir().unwrap();
    let (engine, _clock) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());

    engine.set_online(false);
    assert!(!engine.is_online());
    assert!(!engine.snapshot().is_online);

    assert_eq!(engine.set_online(true), Some(Edge::BecameOnline));
    assert!(engine.snapshot().is_online);
    assert_eq!(engine.set_online(true), None);

    assert_eq!(engine.set_online(false), Some(Edge::BecameOffline));
    assert_eq!(engine.snapshot().is_online, engine.is_online());
}

#[parameterized(
    one_of_five = { 5, 1 },
    three_of_seven = { 7, 3 },
    all_fit = { 4, 10 },
)]
fn test_batch_takes_oldest_first(total: usize, batch: usize) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let dir = tempdir().unwrap();
        let remote = MockRemote::new(Behavior::Accept);
        let (engine, clock) = open_engine(dir.path(), remote.clone(), config(3, batch));
        let ids = enqueue_many(&engine, &clock, total);

        let report = engine.sync_now().await.unwrap();
        let taken = batch.min(total);
        assert_eq!(report.succeeded, taken);
        assert_eq!(report.remaining, total - taken);
        assert_eq!(remote.call_ids(), ids[..taken].to_vec());

        for id in &ids[taken..] {
            let record = engine.get(id).unwrap();
            assert_eq!(record.state, RecordState::Pending);
            assert!(record.last_attempt_at.is_none());
        }
    });
}

#[tokio::test]
async fn test_single_failure_does_not_abort_batch() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let ids = enqueue_many(&engine, &clock, 3);
    remote.push_for(&ids[0], Behavior::Fail);

    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.remaining, 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_commit_times_out_as_failure() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let ids = enqueue_many(&engine, &clock, 2);
    remote.push_for(&ids[0], Behavior::Hang);

    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(engine.get(&ids[0]).unwrap().retry_count, 1);
}

#[tokio::test]
async fn test_pass_records_last_sync_time() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Accept), SyncConfig::default());
    clock.advance(chrono::Duration::minutes(5));
    engine.sync_now().await.unwrap();

    let expected = t0() + chrono::Duration::minutes(5);
    assert_eq!(engine.snapshot().last_sync_time, Some(expected));

    let (reopened, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    assert_eq!(reopened.snapshot().last_sync_time, Some(expected));
}

#[tokio::test]
async fn test_request_stop_before_pass_is_cleared() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Accept), SyncConfig::default());
    enqueue_many(&engine, &clock, 2);

    // A stale request from before the pass does not cancel it.
    engine.request_stop();
    let report = engine.sync_now().await.unwrap();
    assert_eq!(report.succeeded, 2);
}

#[tokio::test]
async fn test_retry_failed_requeues() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Fail);
    let (engine, _) = open_engine(dir.path(), remote.clone(), config(1, 10));
    let id = engine.enqueue(Kind::File, payload(json!({})), "u1").unwrap();
    engine.sync_now().await.unwrap();
    assert_eq!(engine.get(&id).unwrap().state, RecordState::Failed);

    let record = engine.retry_failed(&id).unwrap();
    assert_eq!(record.state, RecordState::Pending);
    assert_eq!(record.retry_count, 0);

    remote.set_default(Behavior::Accept);
    engine.sync_now().await.unwrap();
    assert_eq!(engine.get(&id).unwrap().state, RecordState::Synced);
}

#[test]
fn test_retry_failed_rejects_other_states() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    let id = engine.enqueue(Kind::File, payload(json!({})), "u1").unwrap();

    let err = engine.retry_failed(&id).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState { state: RecordState::Pending, operation: "retry", .. }
    ));
}

#[tokio::test]
async fn test_retry_all_failed() {
    let dir = tempdir().unwrap();
    let (engine, clock) =
        open_engine(dir.path(), MockRemote::new(Behavior::Fail), config(1, 10));
    enqueue_many(&engine, &clock, 3);
    engine.sync_now().await.unwrap();
    assert_eq!(engine.snapshot().failed_count, 3);

    assert_eq!(engine.retry_all_failed().unwrap(), 3);
    assert_eq!(engine.snapshot().pending_count, 3);
}

#[test]
fn test_resolve_twice_is_invalid_state() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    let mut record = make_record("c1", t0());
    record.mark_conflict(payload(json!({})), t0());
    engine.store().append(record).unwrap();
    let id = RecordId::new("c1");

    engine.resolve_conflict(&id, Resolution::KeepLocal, None).unwrap();
    let err = engine.resolve_conflict(&id, Resolution::KeepLocal, None).unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[tokio::test]
async fn test_cleanup_removes_only_old_synced() {
    let dir = tempdir().unwrap();
    let remote = MockRemote::new(Behavior::Accept);
    let (engine, clock) = open_engine(dir.path(), remote.clone(), SyncConfig::default());
    let old = enqueue_many(&engine, &clock, 2);
    remote.push_for(&old[1], Behavior::Fail);
    remote.push_for(&old[1], Behavior::Fail);
    engine.sync_now().await.unwrap();

    clock.advance(chrono::Duration::days(40));
    let fresh = enqueue_many(&engine, &clock, 1);
    engine.sync_now().await.unwrap();

    let report = engine.cleanup(30).unwrap();
    assert_eq!(report.removed, 1);
    assert!(report.bytes_freed > 0);
    assert!(engine.get(&old[0]).is_none());
    // Old but never synced, and fresh synced: both kept.
    assert!(engine.get(&old[1]).is_some());
    assert!(engine.get(&fresh[0]).is_some());
}

#[parameterized(
    beyond_calendar = { u32::MAX },
    very_old = { 200_000_000 },
)]
fn test_cleanup_with_unrepresentable_cutoff_removes_nothing(days: u32) {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    let mut record = make_record("s1", t0());
    record.state = RecordState::Synced;
    engine.store().append(record).unwrap();

    let report = engine.cleanup(days).unwrap();
    assert_eq!(report.removed, 0);
    assert_eq!(report.bytes_freed, 0);
    assert!(engine.get(&RecordId::new("s1")).is_some());
}

#[test]
fn test_storage_pressure_evicts_only_synced() {
    let dir = tempdir().unwrap();
    let (engine, clock) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    for (i, state) in [RecordState::Synced, RecordState::Synced, RecordState::Conflict]
        .into_iter()
        .enumerate()
    {
        let mut record = make_record(&format!("r{i}"), t0());
        record.state = state;
        engine.store().append(record).unwrap();
    }
    let ceiling = engine.store().size_bytes();
    engine.update_config(&ConfigPatch { max_storage_bytes: Some(ceiling), ..Default::default() })
        .unwrap();

    // Pushes past the ceiling; synced records make room.
    enqueue_many(&engine, &clock, 1);
    let states: Vec<RecordState> =
        engine.list(&RecordFilter::all()).into_iter().map(|r| r.state).collect();
    assert!(!states.contains(&RecordState::Synced));
    assert!(states.contains(&RecordState::Conflict));
    assert!(states.contains(&RecordState::Pending));
}

#[test]
fn test_storage_pressure_keeps_unacknowledged_over_ceiling() {
    let dir = tempdir().unwrap();
    let (engine, clock) = open_engine(
        dir.path(),
        MockRemote::default(),
        SyncConfig { max_storage_bytes: 1, ..SyncConfig::default() },
    );
    let ids = enqueue_many(&engine, &clock, 3);
    assert_eq!(engine.list(&RecordFilter::all()).len(), 3);
    assert!(engine.get(&ids[0]).is_some());
}

#[test]
fn test_update_config_validates_and_persists() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());

    let err = engine
        .update_config(&ConfigPatch { batch_size: Some(0), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(engine.config(), SyncConfig::default());

    let updated = engine
        .update_config(&ConfigPatch { sync_interval_ms: Some(5_000), ..Default::default() })
        .unwrap();
    assert_eq!(updated.sync_interval_ms, 5_000);

    // Stored blob wins over the seed on reopen.
    let (reopened, _) = open_engine(dir.path(), MockRemote::default(), config(9, 9));
    assert_eq!(reopened.config().sync_interval_ms, 5_000);
    assert_eq!(reopened.config().batch_size, SyncConfig::default().batch_size);
}

#[test]
fn test_seed_config_applies_without_blob() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), config(5, 2));
    assert_eq!(engine.config().max_retries, 5);
    assert_eq!(engine.config().batch_size, 2);
}

#[test]
fn test_config_update_notifies_watchers() {
    let dir = tempdir().unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), SyncConfig::default());
    let mut rx = engine.config_watch();
    engine.update_config(&ConfigPatch { batch_size: Some(3), ..Default::default() }).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().batch_size, 3);
}

#[test]
fn test_corrupt_queue_does_not_block_startup() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(super::QUEUE_FILE), "not json at all\n").unwrap();
    let (engine, _) = open_engine(dir.path(), MockRemote::default(), config(4, 4));
    assert!(engine.list(&RecordFilter::all()).is_empty());
    assert_eq!(engine.config().max_retries, 4);
}
