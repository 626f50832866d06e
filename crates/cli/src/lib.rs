// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncq - An offline-first mutation queue.
//!
//! Local mutations are appended to a durable queue under `.syncq/` and
//! committed to a remote authority in bounded batches whenever it is
//! reachable. Remote rejections park a record as a conflict; repeated
//! transport failures park it as failed. Both wait for explicit follow-up.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - Queue, pass execution, conflict resolution, cleanup
//! - [`sync::Scheduler`] - Periodic and on-demand pass triggering
//! - [`HostConfig`] - Work directory configuration (`.syncq/config.toml`)
//! - [`Error`] - Error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use syncq::sync::{EngineOptions, SyncEngine, WebSocketRemote};
//! use syncq_core::{Kind, SyncConfig, SystemClock};
//!
//! let engine = SyncEngine::open(
//!     dir,
//!     WebSocketRemote::new("ws://localhost:7890/sync"),
//!     SystemClock,
//!     EngineOptions::default(),
//!     SyncConfig::default(),
//! )?;
//! let id = engine.enqueue(Kind::Progress, payload, "u1")?;
//! let report = engine.sync_now().await?;
//! ```

mod cli;
mod commands;
mod daemon;
mod engine_handle;
mod env;
mod logging;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, ConfigCommand, OutputFormat};
pub use config::{find_work_dir, init_work_dir, HostConfig};
pub use error::{Error, Result};

use syncq_core::RecordFilter;

/// Execute a parsed command line. This is the main entry point for library
/// users and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }

    if let Command::Run { log_file } = cli.command {
        return commands::run::run(log_file);
    }
    logging::init(logging::QUIET, None);

    match cli.command {
        Command::Init { remote, path } => commands::init::run(remote, path),
        Command::Enqueue {
            kind,
            payload,
            owner,
            output,
        } => commands::enqueue::run(kind, &payload, &owner, output.output),
        Command::List {
            status,
            kind,
            owner,
            output,
        } => {
            let filter = RecordFilter {
                kind,
                owner_id: owner,
                state: status,
            };
            commands::list::run(filter, output.output)
        }
        Command::Status { output } => commands::status::run(output.output),
        Command::Sync { output } => commands::sync::run(output.output),
        Command::Resolve {
            id,
            resolution,
            payload,
        } => commands::resolve::run(&id, resolution, payload.as_deref()),
        Command::Retry { id, all } => commands::retry::run(id.as_deref(), all),
        Command::Cleanup {
            older_than_days,
            output,
        } => commands::cleanup::run(older_than_days, output.output),
        Command::Config(cmd) => commands::config::run(cmd),
        Command::Run { log_file } => commands::run::run(log_file),
    }
}
