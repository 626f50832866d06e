// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local IPC between one-shot commands and `syncq run`.
//!
//! `syncq run` holds the store lock for its lifetime and serves engine
//! operations on a Unix socket in the work directory. Commands that find
//! the lock taken forward their operation over that socket instead.

mod client;
mod ipc;
mod server;

pub use client::DaemonClient;
pub use ipc::{DaemonRequest, DaemonResponse};
pub use server::{dispatch, spawn_server};
