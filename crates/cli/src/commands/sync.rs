// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tracing::debug;

use syncq_core::PassReport;

use super::{print_json, runtime, Context};
use crate::cli::OutputFormat;
use crate::daemon::{DaemonRequest, DaemonResponse};
use crate::engine_handle::EngineHandle;
use crate::error::{Error, Result};
use crate::sync::{probe_once, probe_target};

pub fn run(output: OutputFormat) -> Result<()> {
    let ctx = Context::load()?;
    let url = ctx.remote_url().ok_or(Error::NoRemote)?;
    let target = probe_target(&url)?;
    let timeout = ctx.config.engine_options().commit_timeout;

    let report = match ctx.handle()? {
        EngineHandle::Direct { engine, .. } => runtime()?.block_on(async {
            let online = probe_once(&target, timeout).await;
            debug!(addr = %target, online, "probed remote");
            engine.set_online(online);
            engine.sync_now().await
        })?,
        EngineHandle::Daemon(client) => match client.request(&DaemonRequest::SyncNow)? {
            DaemonResponse::Pass { report } => report,
            _ => return Err(Error::Runner("unexpected response".to_string())),
        },
    };

    match output {
        OutputFormat::Text => println!("{}", format_report(&report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

pub fn format_report(report: &PassReport) -> String {
    format!(
        "Synced {}, conflicts {}, failed {}, {} pending left",
        report.succeeded, report.conflicted, report.failed, report.remaining
    )
}
