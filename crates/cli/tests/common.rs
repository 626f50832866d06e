// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The binary with ambient syncq environment cleared.
pub fn syncq() -> Command {
    let mut cmd = cargo_bin_cmd!("syncq");
    cmd.env_remove("SYNCQ_DIR")
        .env_remove("SYNCQ_REMOTE_URL")
        .env_remove("SYNCQ_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory with no remote.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    syncq()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to enqueue a record and return its id.
pub fn enqueue(temp: &TempDir, kind: &str, payload: &str, owner: &str) -> String {
    let output = syncq()
        .args(["enqueue", kind, payload, "--owner", owner])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "enqueue failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Parses stdout of a successful `-o json` invocation.
pub fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
