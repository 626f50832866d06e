// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use syncq_core::SyncConfig;

use super::{print_json, Context};
use crate::cli::{ConfigCommand, ConfigSetArgs, OutputFormat};
use crate::error::{Error, Result};

/// Execute a config subcommand.
pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { output } => show(output.output),
        ConfigCommand::Set { values } => set(&values),
    }
}

fn show(output: OutputFormat) -> Result<()> {
    let ctx = Context::load()?;
    let config = ctx.handle()?.config()?;

    match output {
        OutputFormat::Text => print!("{}", format_config(&config)),
        OutputFormat::Json => print_json(&config)?,
    }
    Ok(())
}

fn set(values: &ConfigSetArgs) -> Result<()> {
    let patch = values.to_patch();
    if patch.is_empty() {
        return Err(Error::Config(
            "nothing to set\n  hint: pass at least one of --max-retries, --sync-interval-ms, \
             --batch-size, --max-storage-bytes"
                .to_string(),
        ));
    }

    let ctx = Context::load()?;
    let config = ctx.handle()?.update_config(&patch)?;

    print!("{}", format_config(&config));
    Ok(())
}

pub fn format_config(config: &SyncConfig) -> String {
    format!(
        "max_retries = {}\nsync_interval_ms = {}\nbatch_size = {}\nmax_storage_bytes = {}\n",
        config.max_retries, config.sync_interval_ms, config.batch_size, config.max_storage_bytes
    )
}
