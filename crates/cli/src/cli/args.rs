// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` to reduce duplication
//! across commands that share common options.

use clap::Args;

use syncq_core::ConfigPatch;

use super::OutputFormat;

/// Output format selection.
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Sync config fields settable from the command line.
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigSetArgs {
    /// Failed attempts before a record is parked as failed
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Scheduler period in milliseconds
    #[arg(long, value_name = "MS")]
    pub sync_interval_ms: Option<u64>,

    /// Maximum records per sync pass
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Storage ceiling in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_storage_bytes: Option<u64>,
}

impl ConfigSetArgs {
    pub fn to_patch(&self) -> ConfigPatch {
        ConfigPatch {
            max_retries: self.max_retries,
            sync_interval_ms: self.sync_interval_ms,
            batch_size: self.batch_size,
            max_storage_bytes: self.max_storage_bytes,
        }
    }
}
