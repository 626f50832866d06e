// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

use syncq_core::{Kind, RecordState};

use crate::sync::{Resolution, DEFAULT_CLEANUP_DAYS};

pub use args::{ConfigSetArgs, OutputArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_kind(s: &str) -> Result<Kind, String> {
    s.parse().map_err(|e: syncq_core::Error| e.to_string())
}

fn parse_state(s: &str) -> Result<RecordState, String> {
    s.parse().map_err(|e: syncq_core::Error| e.to_string())
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    s.parse().map_err(|e: syncq_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "syncq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first mutation queue with periodic sync to a remote authority")]
#[command(
    long_about = "Offline-first mutation queue with periodic sync to a remote authority.\n\n\
    Mutations are queued durably on disk, sent in bounded batches when the remote is reachable, \
    and parked as conflicts or failures for explicit follow-up."
)]
pub struct Cli {
    /// Run as if syncq was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a queue in the current directory (or specified path)
    #[command(after_help = "\
Examples:
  syncq init                               Local-only queue
  syncq init --remote ws://host:7890/sync  Queue that syncs to a remote")]
    Init {
        /// Remote authority URL (ws:// or wss://)
        #[arg(long)]
        remote: Option<String>,

        /// Path to initialize (defaults to current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Queue a mutation
    #[command(after_help = "\
Examples:
  syncq enqueue progress '{\"lesson\": 4}' --owner u1
  syncq enqueue attendance '{\"present\": true}' -u u1 -o json")]
    Enqueue {
        /// Record kind (course, attendance, exam, file, progress, notice)
        #[arg(value_parser = parse_kind)]
        kind: Kind,

        /// Payload as a JSON object
        #[arg(value_parser = non_empty_string)]
        payload: String,

        /// Owning user id
        #[arg(long, short = 'u', value_parser = non_empty_string)]
        owner: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List queued records, oldest first
    List {
        /// Filter by state (pending, synced, conflict, failed)
        #[arg(long, short, value_parser = parse_state)]
        status: Option<RecordState>,

        /// Filter by kind
        #[arg(long, short, value_parser = parse_kind)]
        kind: Option<Kind>,

        /// Filter by owner
        #[arg(long, short = 'u')]
        owner: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show queue status
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run one sync pass now
    Sync {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Resolve a conflicted record
    #[command(after_help = "\
Examples:
  syncq resolve rec-1a2b3c4d5e6f7a8b keep-local
  syncq resolve rec-1a2b3c4d5e6f7a8b accept-remote
  syncq resolve rec-1a2b3c4d5e6f7a8b merge --payload '{\"title\": \"both\"}'")]
    Resolve {
        /// Record id
        id: String,

        /// keep-local, accept-remote or merge
        #[arg(value_parser = parse_resolution)]
        resolution: Resolution,

        /// Merged payload (required for merge)
        #[arg(long)]
        payload: Option<String>,
    },

    /// Return failed records to the queue
    Retry {
        /// Record id
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Retry every failed record
        #[arg(long)]
        all: bool,
    },

    /// Remove synced records older than a number of days
    Cleanup {
        /// Age threshold in days
        #[arg(long, default_value_t = DEFAULT_CLEANUP_DAYS)]
        older_than_days: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage sync configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Run the scheduler until interrupted
    Run {
        /// Write logs to .syncq/syncq.log instead of stderr
        #[arg(long)]
        log_file: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective sync configuration
    Show {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change sync configuration values
    #[command(after_help = "\
Examples:
  syncq config set --batch-size 20
  syncq config set --sync-interval-ms 60000 --max-retries 5")]
    Set {
        #[command(flatten)]
        values: ConfigSetArgs,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
