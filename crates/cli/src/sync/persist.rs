// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Side files stored next to the queue.
//!
//! `sync_config.json` holds the runtime [`SyncConfig`] and `sync_state.json`
//! holds the last successful pass time. Each file loads independently: a
//! damaged one is reported and replaced by its default without affecting
//! the queue or the other file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use syncq_core::SyncConfig;

use crate::error::Result;

pub const CONFIG_FILE: &str = "sync_config.json";
pub const STATE_FILE: &str = "sync_state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SyncState {
    #[serde(default)]
    last_sync_time: Option<DateTime<Utc>>,
}

/// Accessor for the persisted side files of one work directory.
#[derive(Debug, Clone)]
pub struct SideState {
    dir: PathBuf,
}

impl SideState {
    pub fn new(dir: &Path) -> Self {
        SideState { dir: dir.to_path_buf() }
    }

    /// Stored config, or `None` when no blob has been written yet.
    ///
    /// A blob that does not parse or validate is reported and ignored.
    pub fn load_config(&self) -> Option<SyncConfig> {
        let config: SyncConfig = load_json(&self.dir.join(CONFIG_FILE))?;
        match config.validate() {
            Ok(()) => Some(config),
            Err(e) => {
                warn!(error = %e, "ignoring invalid stored sync config");
                None
            }
        }
    }

    pub fn save_config(&self, config: &SyncConfig) -> Result<()> {
        write_json(&self.dir.join(CONFIG_FILE), config)
    }

    pub fn load_last_sync(&self) -> Option<DateTime<Utc>> {
        load_json::<SyncState>(&self.dir.join(STATE_FILE))?.last_sync_time
    }

    pub fn save_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        write_json(&self.dir.join(STATE_FILE), &SyncState { last_sync_time: Some(at) })
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read side file, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "side file is corrupt, using defaults");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    let tmp = path.with_file_name(name);
    {
        let mut file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        writeln!(file)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
