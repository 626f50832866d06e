// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! Local mutations are queued durably and reconciled with a remote
//! authority in bounded passes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Scheduler  │────►│   Engine    │────►│   Remote    │
//! │ (ticks, now)│     │ (SyncEngine)│◄────│ (trait)     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │
//!        │                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │Connectivity │     │ QueueStore  │────►│   Status    │
//! │  (edges)    │     │ (JSONL)     │     │ (watch)     │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - JSONL queue, fsynced on enqueue, atomically rewritten on change
//! - FIFO batches with per-record timeout and bounded retries
//! - Conflicts parked until an explicit resolution
//! - Storage ceiling enforced by evicting synced records only
//! - Coalescing status broadcast
//! - Injectable remote and clock for testing

mod connectivity;
mod engine;
mod persist;
mod queue;
mod remote;
mod resolver;
mod scheduler;
mod status;

pub use connectivity::{probe_once, probe_target, spawn_probe, Connectivity, ConnectivityEvents, Edge};
pub use engine::{EngineOptions, SyncEngine, DEFAULT_CLEANUP_DAYS};
pub use persist::{SideState, CONFIG_FILE, STATE_FILE};
pub use queue::{QueueStore, QUEUE_FILE};
pub use remote::{CommitOutcome, RemoteAuthority, TransportError, UnconfiguredRemote, WebSocketRemote};
pub use resolver::{Resolution, Resolved};
pub use scheduler::{PassTrigger, Scheduler};
pub use status::{StatusPublisher, Subscription, Unsubscriber};

#[cfg(test)]
pub(crate) mod test_helpers;


#[cfg(test)]
mod engine_tests;

#[cfg(test)]
mod integration_tests;
