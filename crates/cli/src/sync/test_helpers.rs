// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use syncq_core::{Kind, ManualClock, Payload, Record, RecordId, SyncConfig};

use super::engine::{EngineOptions, SyncEngine};
use super::remote::{CommitOutcome, RemoteAuthority};

/// What the mock remote does with one commit.
#[derive(Debug, Clone)]
pub enum Behavior {
    Accept,
    Conflict(Payload),
    Fail,
    /// Never answers; exercises the commit timeout.
    Hang,
}

#[derive(Default)]
struct Script {
    default: Option<Behavior>,
    per_record: HashMap<RecordId, VecDeque<Behavior>>,
    calls: Vec<Record>,
}

/// Deterministic scripted remote.
///
/// Clones share the script, so a test can keep a handle after moving one
/// into the engine.
#[derive(Clone, Default)]
pub struct MockRemote {
    script: Arc<Mutex<Script>>,
}

impl MockRemote {
    pub fn new(default: Behavior) -> Self {
        let remote = MockRemote::default();
        remote.set_default(default);
        remote
    }

    pub fn set_default(&self, behavior: Behavior) {
        self.script.lock().unwrap().default = Some(behavior);
    }

    /// Queues a one-off behavior for `id`, used before the default.
    pub fn push_for(&self, id: &RecordId, behavior: Behavior) {
        self.script.lock().unwrap().per_record.entry(id.clone()).or_default().push_back(behavior);
    }

    /// Every record committed so far, in call order.
    pub fn calls(&self) -> Vec<Record> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_ids(&self) -> Vec<RecordId> {
        self.calls().into_iter().map(|r| r.id).collect()
    }
}

impl RemoteAuthority for MockRemote {
    fn commit(
        &mut self,
        record: &Record,
    ) -> Pin<Box<dyn Future<Output = CommitOutcome> + Send + '_>> {
        let behavior = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(record.clone());
            let scripted = script.per_record.get_mut(&record.id).and_then(|q| q.pop_front());
            scripted.or_else(|| script.default.clone()).unwrap_or(Behavior::Accept)
        };
        Box::pin(async move {
            match behavior {
                Behavior::Accept => CommitOutcome::Accepted,
                Behavior::Conflict(remote) => CommitOutcome::Conflict { remote },
                Behavior::Fail => CommitOutcome::Error("mock failure".to_string()),
                Behavior::Hang => std::future::pending().await,
            }
        })
    }
}

pub type TestEngine = SyncEngine<MockRemote, Arc<ManualClock>>;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub fn payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

pub fn make_record(id: &str, created_at: DateTime<Utc>) -> Record {
    Record::new(
        RecordId::new(id),
        Kind::Progress,
        payload(json!({"id": id})),
        "u1",
        created_at,
    )
}

pub fn open_engine(dir: &Path, remote: MockRemote, config: SyncConfig) -> (TestEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let engine = SyncEngine::open(
        dir,
        remote,
        Arc::clone(&clock),
        EngineOptions { commit_timeout: Duration::from_secs(1) },
        config,
    )
    .unwrap();
    (engine, clock)
}

/// Enqueues `count` records one second apart and returns their ids.
pub fn enqueue_many(engine: &TestEngine, clock: &ManualClock, count: usize) -> Vec<RecordId> {
    (0..count)
        .map(|i| {
            let id = engine.enqueue(Kind::Progress, payload(json!({"n": i})), "u1").unwrap();
            clock.advance(chrono::Duration::seconds(1));
            id
        })
        .collect()
}
