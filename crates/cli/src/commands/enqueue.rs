// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use syncq_core::Kind;

use super::{parse_payload, print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(kind: Kind, payload: &str, owner: &str, output: OutputFormat) -> Result<()> {
    let payload = parse_payload(payload)?;
    let ctx = Context::load()?;
    let id = ctx.handle()?.enqueue(kind, payload, owner)?;

    match output {
        OutputFormat::Text => println!("{}", id),
        OutputFormat::Json => print_json(&json!({ "id": id, "kind": kind, "owner_id": owner }))?,
    }
    Ok(())
}
