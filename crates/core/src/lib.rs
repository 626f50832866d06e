// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncq-core: Shared data model for the syncq offline mutation queue
//!
//! This crate provides the record types, configuration, status snapshot,
//! clock abstraction, JSONL persistence helpers, and wire protocol used by
//! the syncq engine and CLI.

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod jsonl;
pub mod protocol;
pub mod record;
pub mod status;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use config::{ConfigPatch, SyncConfig};
pub use error::{Error, Result};
pub use id::RecordId;
pub use record::{Kind, Payload, Record, RecordFilter, RecordState};
pub use status::{CleanupReport, PassReport, SyncStatus};
