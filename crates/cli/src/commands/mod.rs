// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cleanup;
pub mod config;
pub mod enqueue;
pub mod init;
pub mod list;
pub mod resolve;
pub mod retry;
pub mod run;
pub mod status;
pub mod sync;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use syncq_core::{Payload, SystemClock};

use crate::config::{find_work_dir, lock_path, socket_path, HostConfig};
use crate::daemon::DaemonClient;
use crate::engine_handle::EngineHandle;
use crate::error::{Error, Result};
use crate::sync::{RemoteAuthority, SyncEngine, UnconfiguredRemote, WebSocketRemote};

/// How long a command waits for the lock or for `syncq run` to come up.
const HANDLE_WAIT: Duration = Duration::from_secs(5);
const HANDLE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Engine type used by the CLI.
pub type Engine = SyncEngine<Box<dyn RemoteAuthority>, SystemClock>;

/// Work directory plus its host config.
pub struct Context {
    pub work_dir: PathBuf,
    pub config: HostConfig,
}

impl Context {
    /// Locates and loads the work directory for the current context.
    pub fn load() -> Result<Self> {
        let work_dir = find_work_dir()?;
        let config = HostConfig::load(&work_dir)?;
        Ok(Context { work_dir, config })
    }

    pub fn remote_url(&self) -> Option<String> {
        self.config.effective_remote_url()
    }

    /// Opens the engine with the configured remote, if any.
    pub fn open_engine(&self) -> Result<Engine> {
        let remote: Box<dyn RemoteAuthority> = match self.remote_url() {
            Some(url) => Box::new(WebSocketRemote::new(url)),
            None => Box::new(UnconfiguredRemote),
        };
        SyncEngine::open(
            &self.work_dir,
            remote,
            SystemClock,
            self.config.engine_options(),
            self.config.seed(),
        )
    }

    /// Opens the engine under the work directory lock, or forwards to
    /// `syncq run` when it holds the lock.
    pub fn handle(&self) -> Result<EngineHandle> {
        self.handle_within(HANDLE_WAIT)
    }

    /// Like [`Context::handle`], giving up with [`Error::StoreLocked`] once
    /// `wait` has passed without the lock or a live runner.
    pub fn handle_within(&self, wait: Duration) -> Result<EngineHandle> {
        let deadline = Instant::now() + wait;
        let socket = socket_path(&self.work_dir);
        loop {
            match acquire_lock(&self.work_dir) {
                Ok(lock) => {
                    let engine = self.open_engine()?;
                    return Ok(EngineHandle::Direct { engine, _lock: lock });
                }
                Err(Error::StoreLocked) => {}
                Err(e) => return Err(e),
            }

            if socket.exists() {
                match DaemonClient::connect(&socket) {
                    Ok(client) => {
                        debug!(socket = %socket.display(), "forwarding to syncq run");
                        return Ok(EngineHandle::Daemon(client));
                    }
                    Err(e) => debug!(error = %e, "runner socket not answering"),
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::StoreLocked);
            }
            std::thread::sleep(HANDLE_RETRY_DELAY);
        }
    }
}

/// Takes the single-writer lock on the work directory.
///
/// Held by `syncq run` for its lifetime and by one-shot commands that open
/// the engine themselves for theirs.
pub fn acquire_lock(work_dir: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(work_dir))?;

    // Try to acquire exclusive lock (non-blocking)
    file.try_lock_exclusive().map_err(|_| Error::StoreLocked)?;

    Ok(file)
}

/// Builds the runtime for commands that talk to the remote.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Parses a payload argument; it must be a JSON object.
pub fn parse_payload(raw: &str) -> Result<Payload> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(Error::PayloadNotObject),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
