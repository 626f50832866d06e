// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor.
//!
//! Tracks whether the remote is reachable and emits an edge only when the
//! state actually changes. The state itself comes from outside (a host
//! signal, or the TCP probe below); this module never retries or backs off.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    BecameOnline,
    BecameOffline,
}

/// Current reachability of the remote plus an edge stream.
pub struct Connectivity {
    state: watch::Sender<bool>,
    edges: broadcast::Sender<Edge>,
}

impl Connectivity {
    /// Starts online.
    pub fn new() -> Self {
        Self::with_state(true)
    }

    pub fn with_state(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        let (edges, _) = broadcast::channel(16);
        Connectivity { state, edges }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Records the host signal. Returns the edge, if the state changed.
    pub fn set_online(&self, online: bool) -> Option<Edge> {
        let changed = self.state.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if !changed {
            return None;
        }

        let edge = if online { Edge::BecameOnline } else { Edge::BecameOffline };
        info!(online, "connectivity changed");
        let _ = self.edges.send(edge);
        Some(edge)
    }

    /// Stream of future edges.
    pub fn subscribe(&self) -> ConnectivityEvents {
        ConnectivityEvents { rx: self.edges.subscribe() }
    }

    /// Receiver for the level (not the edges).
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the edge stream.
pub struct ConnectivityEvents {
    rx: broadcast::Receiver<Edge>,
}

impl ConnectivityEvents {
    /// Next edge, or `None` once the monitor is gone.
    ///
    /// A slow receiver that lagged behind skips to the newest edges.
    pub async fn next_edge(&mut self) -> Option<Edge> {
        loop {
            match self.rx.recv().await {
                Ok(edge) => return Some(edge),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "connectivity receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Extracts `host:port` from a `ws://` or `wss://` URL.
pub fn probe_target(url: &str) -> Result<String> {
    let (rest, default_port) = if let Some(rest) = url.strip_prefix("ws://") {
        (rest, 80)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        (rest, 443)
    } else {
        return Err(Error::InvalidRemoteUrl(url.to_string()));
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(Error::InvalidRemoteUrl(url.to_string()));
    }

    let has_port = if let Some(end) = authority.rfind(']') {
        authority[end..].contains(':')
    } else {
        authority.contains(':')
    };
    if has_port {
        Ok(authority.to_string())
    } else {
        Ok(format!("{authority}:{default_port}"))
    }
}

/// One reachability check: a TCP connect to `target` within `timeout`.
pub async fn probe_once(target: &str, timeout: Duration) -> bool {
    let attempt = async {
        let addrs: Vec<SocketAddr> = lookup_host(target).await.ok()?.collect();
        for addr in addrs {
            if TcpStream::connect(addr).await.is_ok() {
                return Some(());
            }
        }
        None
    };
    matches!(tokio::time::timeout(timeout, attempt).await, Ok(Some(())))
}

/// Probes `target` every `interval` and hands each result to `report` until
/// `cancel` fires. The first probe runs immediately.
pub fn spawn_probe<F>(
    target: String,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
    report: F,
) -> tokio::task::JoinHandle<()>
where
    F: Fn(bool) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let online = tokio::select! {
                        _ = cancel.cancelled() => break,
                        online = probe_once(&target, timeout) => online,
                    };
                    debug!(addr = %target, online, "probe");
                    report(online);
                }
            }
        }
    })
}
