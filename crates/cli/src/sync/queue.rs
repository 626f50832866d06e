// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue store.
//!
//! Records live in memory behind a single mutex and are mirrored to a JSONL
//! file, one record per line. Inserts append and fsync before returning;
//! every other mutation rewrites the file atomically. A mutation that fails
//! to reach disk is rolled back in memory, so memory never runs ahead of
//! the file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::warn;

use syncq_core::{jsonl, CleanupReport, Kind, Payload, Record, RecordFilter, RecordId, RecordState};

use super::status::StatusPublisher;
use crate::error::{Error, Result};

/// Queue file name inside the work directory.
pub const QUEUE_FILE: &str = "queue.jsonl";

struct Inner {
    records: Vec<Record>,
    bytes: u64,
    /// The file on disk still holds unreadable content that could not be
    /// moved aside. The next write replaces it instead of appending.
    stale_file: bool,
}

/// Single-writer record store backed by `queue.jsonl`.
pub struct QueueStore {
    path: PathBuf,
    inner: Mutex<Inner>,
    publisher: Arc<StatusPublisher>,
}

impl QueueStore {
    /// Loads the store from `path`.
    ///
    /// A missing file yields an empty store. An unreadable file is moved
    /// aside to `<name>.corrupt` and the store starts empty. If it cannot be
    /// moved, it is left in place and overwritten by the first write.
    ///
    /// Callers must hold the work directory lock.
    pub fn open(path: &Path, publisher: Arc<StatusPublisher>) -> Result<Self> {
        let mut stale_file = false;
        let loaded = match jsonl::read_all::<Record>(path) {
            Ok(records) => records,
            Err(e) if is_corruption(&e) => {
                let aside = corrupt_path(path);
                warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "queue file is corrupt, starting with an empty queue"
                );
                if let Err(e) = std::fs::rename(path, &aside) {
                    warn!(path = %path.display(), error = %e, "could not move corrupt queue aside");
                    stale_file = true;
                }
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<Record> = Vec::with_capacity(loaded.len());
        for record in loaded {
            if records.iter().any(|r| r.id == record.id) {
                warn!(id = %record.id, "dropping duplicate record on load");
                continue;
            }
            records.push(record);
        }
        let bytes = jsonl::encoded_size(&records)?;
        publisher.update_queue(&records, bytes);

        Ok(QueueStore {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { records, bytes, stale_file }),
            publisher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates a pending record with a fresh unique id and persists it.
    pub fn insert_new(
        &self,
        kind: Kind,
        payload: Payload,
        owner_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Record> {
        let mut inner = self.lock();
        let id = RecordId::derive_unique(kind, owner_id, &created_at, &payload, |candidate| {
            inner.records.iter().any(|r| &r.id == candidate)
        });
        let record = Record::new(id, kind, payload, owner_id, created_at);
        self.push(&mut inner, record.clone())?;
        Ok(record)
    }

    /// Persists a fully formed record. Duplicate ids are rejected.
    pub fn append(&self, record: Record) -> Result<()> {
        let mut inner = self.lock();
        if inner.records.iter().any(|r| r.id == record.id) {
            return Err(Error::DuplicateRecord(record.id.to_string()));
        }
        self.push(&mut inner, record)
    }

    /// Records matching `filter`, oldest first.
    pub fn list_all(&self, filter: &RecordFilter) -> Vec<Record> {
        let inner = self.lock();
        let mut records: Vec<Record> =
            inner.records.iter().filter(|r| filter.matches(r)).cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.lock().records.iter().find(|r| &r.id == id).cloned()
    }

    /// Up to `limit` pending records, oldest first.
    pub fn oldest_pending(&self, limit: usize) -> Vec<Record> {
        let mut pending = self.list_all(&RecordFilter::with_state(RecordState::Pending));
        pending.truncate(limit);
        pending
    }

    /// Applies `mutator` to a copy of the record and persists the result.
    ///
    /// The lookup, the mutation and the write happen under one lock. If the
    /// mutator fails, or the write fails, the stored record is unchanged.
    /// The id cannot be changed.
    pub fn replace<F>(&self, id: &RecordId, mutator: F) -> Result<Record>
    where
        F: FnOnce(&mut Record) -> Result<()>,
    {
        let mut inner = self.lock();
        let index = inner
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        let mut updated = inner.records[index].clone();
        mutator(&mut updated)?;
        updated.id = id.clone();

        let previous = std::mem::replace(&mut inner.records[index], updated.clone());
        if let Err(e) = self.rewrite(&mut inner) {
            inner.records[index] = previous;
            return Err(e);
        }
        Ok(updated)
    }

    /// Removes one record after `guard` approves it.
    pub fn take<F>(&self, id: &RecordId, guard: F) -> Result<Record>
    where
        F: FnOnce(&Record) -> Result<()>,
    {
        let mut inner = self.lock();
        let index = inner
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        guard(&inner.records[index])?;

        let removed = inner.records.remove(index);
        if let Err(e) = self.rewrite(&mut inner) {
            inner.records.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Removes every record matching `predicate` and returns them.
    pub fn remove_where<P>(&self, mut predicate: P) -> Result<Vec<Record>>
    where
        P: FnMut(&Record) -> bool,
    {
        let mut inner = self.lock();
        if !inner.records.iter().any(&mut predicate) {
            return Ok(Vec::new());
        }

        let previous = inner.records.clone();
        let (removed, kept): (Vec<Record>, Vec<Record>) =
            previous.iter().cloned().partition(|r| predicate(r));
        inner.records = kept;
        if let Err(e) = self.rewrite(&mut inner) {
            inner.records = previous;
            return Err(e);
        }
        Ok(removed)
    }

    /// Evicts synced records, oldest first, until the store fits in
    /// `target_bytes` or no synced record is left.
    ///
    /// Unacknowledged records are never touched.
    pub fn evict_synced(&self, target_bytes: u64) -> Result<CleanupReport> {
        let mut inner = self.lock();
        if inner.bytes <= target_bytes {
            return Ok(CleanupReport::default());
        }

        let mut synced: Vec<&Record> =
            inner.records.iter().filter(|r| r.state == RecordState::Synced).collect();
        synced.sort_by_key(|r| r.created_at);

        let mut bytes = inner.bytes;
        let mut evict: Vec<RecordId> = Vec::new();
        for record in synced {
            if bytes <= target_bytes {
                break;
            }
            bytes = bytes.saturating_sub(record.encoded_len()? as u64);
            evict.push(record.id.clone());
        }
        if evict.is_empty() {
            return Ok(CleanupReport::default());
        }

        let before = inner.bytes;
        let previous = inner.records.clone();
        inner.records.retain(|r| !evict.contains(&r.id));
        if let Err(e) = self.rewrite(&mut inner) {
            inner.records = previous;
            return Err(e);
        }
        Ok(CleanupReport { removed: evict.len(), bytes_freed: before.saturating_sub(inner.bytes) })
    }

    /// Serialized size of all records.
    pub fn size_bytes(&self) -> u64 {
        self.lock().bytes
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, inner: &mut Inner, record: Record) -> Result<()> {
        if inner.stale_file {
            inner.records.push(record);
            if let Err(e) = self.rewrite(inner) {
                inner.records.pop();
                return Err(e);
            }
            return Ok(());
        }

        let len = record.encoded_len()? as u64;
        jsonl::append(&self.path, &record)?;
        inner.records.push(record);
        inner.bytes += len;
        self.publisher.update_queue(&inner.records, inner.bytes);
        Ok(())
    }

    fn rewrite(&self, inner: &mut Inner) -> Result<()> {
        jsonl::write_all(&self.path, &inner.records)?;
        inner.stale_file = false;
        inner.bytes = jsonl::encoded_size(&inner.records)?;
        self.publisher.update_queue(&inner.records, inner.bytes);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_corruption(e: &syncq_core::Error) -> bool {
    match e {
        syncq_core::Error::CorruptedData(_) | syncq_core::Error::Json(_) => true,
        syncq_core::Error::Io(io) => io.kind() == std::io::ErrorKind::InvalidData,
        _ => false,
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}
