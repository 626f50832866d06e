// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `SYNCQ_DIR` if set.
///
/// Overrides work directory discovery.
pub fn work_dir() -> Option<PathBuf> {
    std::env::var(vars::SYNCQ_DIR).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the value of `SYNCQ_LOG` if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::SYNCQ_LOG).ok()
}

/// Returns the value of `SYNCQ_REMOTE_URL` if set.
///
/// Takes precedence over `remote_url` in `config.toml`.
pub fn remote_url() -> Option<String> {
    std::env::var(vars::SYNCQ_REMOTE_URL).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
