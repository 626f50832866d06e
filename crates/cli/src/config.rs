// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host configuration.
//!
//! Configuration is stored in `.syncq/config.toml` and includes:
//! - `remote_url`: WebSocket URL of the remote authority
//! - `commit_timeout_ms`: upper bound on one remote commit
//! - `probe_interval_ms`: how often `syncq run` checks reachability
//! - `[sync]`: optional seed for the runtime sync config

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use syncq_core::{ConfigPatch, SyncConfig};

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{probe_target, EngineOptions};

pub const WORK_DIR_NAME: &str = ".syncq";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOCK_FILE_NAME: &str = "run.lock";
const LOG_FILE_NAME: &str = "syncq.log";
const SOCKET_FILE_NAME: &str = "run.sock";

/// Host configuration stored in `.syncq/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Remote authority URL (`ws://` or `wss://`). Absent means local-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    /// Maximum time to wait for one commit in milliseconds (default: 10000).
    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,
    /// Reachability probe interval in milliseconds (default: 5000).
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Seed for the sync config, used until `syncq config set` stores one.
    #[serde(default, skip_serializing_if = "ConfigPatch::is_empty")]
    pub sync: ConfigPatch,
}

fn default_commit_timeout_ms() -> u64 {
    10_000
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            remote_url: None,
            commit_timeout_ms: default_commit_timeout_ms(),
            probe_interval_ms: default_probe_interval_ms(),
            sync: ConfigPatch::default(),
        }
    }
}

impl HostConfig {
    /// Loads configuration from the given `.syncq/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: HostConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the given `.syncq/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.remote_url {
            probe_target(url)?;
        }
        if self.commit_timeout_ms == 0 {
            return Err(Error::Config("commit_timeout_ms must be positive".into()));
        }
        if self.probe_interval_ms == 0 {
            return Err(Error::Config("probe_interval_ms must be positive".into()));
        }
        self.seed().validate()?;
        Ok(())
    }

    /// Remote URL, with `SYNCQ_REMOTE_URL` taking precedence.
    pub fn effective_remote_url(&self) -> Option<String> {
        env::remote_url().or_else(|| self.remote_url.clone())
    }

    /// Sync config to use when no runtime config has been stored.
    pub fn seed(&self) -> SyncConfig {
        SyncConfig::default().apply(&self.sync)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions { commit_timeout: Duration::from_millis(self.commit_timeout_ms) }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}

/// Finds the `.syncq` directory.
///
/// `SYNCQ_DIR` names it directly; otherwise walk up from the current
/// directory.
pub fn find_work_dir() -> Result<PathBuf> {
    if let Some(dir) = env::work_dir() {
        if dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(dir);
        }
        return Err(Error::NotInitialized);
    }

    let mut current = std::env::current_dir()?;
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Creates `.syncq/` under `path` with a fresh config.
pub fn init_work_dir(path: &Path, remote_url: Option<&str>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = HostConfig { remote_url: remote_url.map(str::to_string), ..HostConfig::default() };
    config.validate()?;

    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

pub fn lock_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOCK_FILE_NAME)
}

pub fn log_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOG_FILE_NAME)
}

/// Socket `syncq run` listens on for forwarded commands.
pub fn socket_path(work_dir: &Path) -> PathBuf {
    work_dir.join(SOCKET_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
