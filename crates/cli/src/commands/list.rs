// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use syncq_core::{Record, RecordFilter};

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(filter: RecordFilter, output: OutputFormat) -> Result<()> {
    let ctx = Context::load()?;
    let records = ctx.handle()?.list(&filter)?;

    match output {
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No records.");
                return Ok(());
            }
            for record in &records {
                println!("{}", format_line(record));
            }
        }
        OutputFormat::Json => print_json(&records)?,
    }
    Ok(())
}

/// One-line summary of a record.
pub fn format_line(record: &Record) -> String {
    let mut line = format!(
        "{}  {:<8}  {:<10}  {}  {}",
        record.id,
        record.state.as_str(),
        record.kind.as_str(),
        record.owner_id,
        record.created_at.format("%Y-%m-%d %H:%M:%S"),
    );
    if record.retry_count > 0 {
        line.push_str(&format!("  retries={}", record.retry_count));
    }
    line
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
