// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use syncq_core::SyncStatus;

use super::{print_json, runtime, Context};
use crate::cli::OutputFormat;
use crate::engine_handle::EngineHandle;
use crate::error::Result;
use crate::sync::{probe_once, probe_target};

pub fn run(output: OutputFormat) -> Result<()> {
    let ctx = Context::load()?;
    let handle = ctx.handle()?;

    // `syncq run` tracks connectivity itself; a local engine needs a probe.
    if let EngineHandle::Direct { engine, .. } = &handle {
        let online = match ctx.remote_url() {
            Some(url) => {
                let target = probe_target(&url)?;
                let timeout = ctx.config.engine_options().commit_timeout;
                runtime()?.block_on(probe_once(&target, timeout))
            }
            None => false,
        };
        engine.set_online(online);
    }
    let status = handle.status()?;

    match output {
        OutputFormat::Text => print!("{}", format_status(&status, ctx.remote_url().as_deref())),
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

/// Human-readable status block.
pub fn format_status(status: &SyncStatus, remote: Option<&str>) -> String {
    let connectivity = match (remote, status.is_online) {
        (None, _) => "no remote configured".to_string(),
        (Some(url), true) => format!("online ({url})"),
        (Some(url), false) => format!("offline ({url})"),
    };
    let last_sync = status
        .last_sync_time
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut out = String::new();
    out.push_str(&format!("Remote:    {connectivity}\n"));
    out.push_str(&format!("Last sync: {last_sync}\n"));
    out.push_str(&format!("Pending:   {}\n", status.pending_count));
    out.push_str(&format!("Conflicts: {}\n", status.conflict_count));
    out.push_str(&format!("Failed:    {}\n", status.failed_count));
    out.push_str(&format!("Storage:   {} bytes\n", status.total_bytes));
    if status.has_conflicts() {
        out.push_str("\n  hint: run 'syncq list --status conflict' and 'syncq resolve <id> ...'\n");
    }
    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
