// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::config::init_work_dir;
use crate::error::Result;

pub fn run(remote: Option<String>, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let work_dir = init_work_dir(&target_path, remote.as_deref())?;

    println!("Initialized syncq at {}", work_dir.display());
    match remote {
        Some(url) => println!("Remote: {}", url),
        None => println!("Remote: none (records stay queued until one is configured)"),
    }
    Ok(())
}
