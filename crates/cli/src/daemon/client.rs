// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! IPC client for forwarding operations to `syncq run`.

use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

use super::ipc::{framing, DaemonRequest, DaemonResponse};

/// Connection timeout for runner communication.
const TIMEOUT_SECS: u64 = 5;

/// A client for a running `syncq run`. Each request uses its own
/// connection.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to the runner at the given socket path and check that it
    /// answers.
    pub fn connect(socket_path: &Path) -> Result<Self> {
        let client = DaemonClient { socket_path: socket_path.to_path_buf() };
        match client.request(&DaemonRequest::Ping)? {
            DaemonResponse::Pong => Ok(client),
            _ => Err(Error::Runner("unexpected response to ping".to_string())),
        }
    }

    /// Send a request and receive its response.
    ///
    /// Sync passes are bounded by the commit timeout on the runner side, so
    /// `SyncNow` waits without a read timeout.
    pub fn request(&self, request: &DaemonRequest) -> Result<DaemonResponse> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| Error::Runner(format!("failed to connect: {}", e)))?;
        let read_timeout = match request {
            DaemonRequest::SyncNow => None,
            _ => Some(Duration::from_secs(TIMEOUT_SECS)),
        };
        stream.set_read_timeout(read_timeout)?;
        stream.set_write_timeout(Some(Duration::from_secs(TIMEOUT_SECS)))?;

        framing::write_message(&mut stream, request)?;
        match framing::read_message(&mut stream)? {
            DaemonResponse::Error { message } => Err(Error::Forwarded(message)),
            response => Ok(response),
        }
    }
}
