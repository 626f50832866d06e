// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use syncq_core::RecordId;

use super::{parse_payload, Context};
use crate::error::Result;
use crate::sync::{Resolution, Resolved};

pub fn run(id: &str, resolution: Resolution, payload: Option<&str>) -> Result<()> {
    let merged = payload.map(parse_payload).transpose()?;
    let ctx = Context::load()?;
    let handle = ctx.handle()?;

    match handle.resolve(&RecordId::new(id), resolution, merged)? {
        Resolved::Requeued(record) => println!("{} requeued ({})", record.id, resolution),
        Resolved::Discarded(record) => println!("{} discarded, remote version kept", record.id),
    }
    Ok(())
}
