// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! The filter comes from `SYNCQ_LOG`, then `RUST_LOG`, then the per-command
//! default. Output goes to stderr unless a log file is given.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env;

/// Default filter for one-shot commands.
pub const QUIET: &str = "warn";
/// Default filter for `syncq run`.
pub const VERBOSE: &str = "info";

/// Builds the filter from the environment, falling back to `default`.
pub fn filter(default: &str) -> EnvFilter {
    if let Some(directives) = env::log_filter() {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(default: &str, log_file: Option<&Path>) {
    let filter = filter(default);

    // Try to open log file, fall back to stderr
    if let Some(file) =
        log_file.and_then(|path| fs::OpenOptions::new().create(true).append(true).open(path).ok())
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
