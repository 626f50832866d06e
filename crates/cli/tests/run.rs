// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

use std::path::Path;
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

/// A background `syncq run`, killed on drop.
struct Runner(Child);

impl Runner {
    fn start(temp: &TempDir) -> Self {
        let child = std::process::Command::new(env!("CARGO_BIN_EXE_syncq"))
            .arg("run")
            .current_dir(temp.path())
            .env_remove("SYNCQ_DIR")
            .env_remove("SYNCQ_REMOTE_URL")
            .env_remove("SYNCQ_LOG")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn syncq run");
        let runner = Runner(child);
        wait_for(&temp.path().join(".syncq/run.sock"));
        runner
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn wait_for(socket: &Path) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !socket.exists() {
        assert!(Instant::now() < deadline, "syncq run did not open {}", socket.display());
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn enqueue_while_run_is_active() {
    let temp = init_temp();
    let _runner = Runner::start(&temp);

    let id = enqueue(&temp, "progress", r#"{"lesson": 4}"#, "u1");
    assert!(id.starts_with("rec-"));

    let records = json_output(syncq().args(["list", "-o", "json"]).current_dir(temp.path()));
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["state"], "pending");

    let status = json_output(syncq().args(["status", "-o", "json"]).current_dir(temp.path()));
    assert_eq!(status["pending_count"], 1);
    assert_eq!(status["is_online"], false);
}

#[test]
fn manage_commands_while_run_is_active() {
    let temp = init_temp();
    let _runner = Runner::start(&temp);

    syncq()
        .args(["config", "set", "--batch-size", "5"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("batch_size = 5"));

    let config = json_output(syncq().args(["config", "show", "-o", "json"]).current_dir(temp.path()));
    assert_eq!(config["batch_size"], 5);

    syncq()
        .args(["cleanup", "--older-than-days", "1"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0"));

    // Engine errors surface through the runner unchanged.
    syncq()
        .args(["retry", "rec-0000000000000000"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("record not found"));
}

#[test]
fn sync_while_run_is_active_without_remote() {
    let temp = init_temp();
    let _runner = Runner::start(&temp);

    syncq()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no remote configured"));
}
