// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(older_than_days: u32, output: OutputFormat) -> Result<()> {
    let ctx = Context::load()?;
    let report = ctx.handle()?.cleanup(older_than_days)?;

    match output {
        OutputFormat::Text => println!(
            "Removed {} synced record(s) older than {} days, freed {} bytes",
            report.removed, older_than_days, report.bytes_freed
        ),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}
