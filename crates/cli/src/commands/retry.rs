// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use syncq_core::RecordId;

use super::Context;
use crate::error::Result;

pub fn run(id: Option<&str>, all: bool) -> Result<()> {
    let ctx = Context::load()?;
    let handle = ctx.handle()?;

    match id {
        Some(id) if !all => {
            let record = handle.retry(&RecordId::new(id))?;
            println!("{} requeued", record.id);
        }
        _ => {
            let count = handle.retry_all()?;
            println!("Requeued {} failed record(s)", count);
        }
    }
    Ok(())
}
