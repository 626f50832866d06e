// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Socket side of `syncq run`: accepts forwarded requests and applies them
//! to the engine it owns.

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use syncq_core::ClockSource;

use crate::error::Result;
use crate::sync::{RemoteAuthority, SyncEngine};

use super::ipc::{framing_async, DaemonRequest, DaemonResponse};

/// Serves requests on `listener` until `cancel` fires. Each connection is
/// handled on its own task so a slow sync pass does not block other
/// commands.
pub fn spawn_server<R, C>(
    listener: UnixListener,
    engine: Arc<SyncEngine<R, C>>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    R: RemoteAuthority + 'static,
    C: ClockSource + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.accept() => match result {
                    Ok((stream, _)) => {
                        let engine = Arc::clone(&engine);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &engine).await {
                                debug!(error = %e, "ipc connection failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "ipc accept failed"),
                },
            }
        }
        debug!("ipc server stopped");
    })
}

async fn handle_connection<R, C>(mut stream: UnixStream, engine: &SyncEngine<R, C>) -> Result<()>
where
    R: RemoteAuthority,
    C: ClockSource,
{
    let request: DaemonRequest = framing_async::read_message(&mut stream).await?;
    let response = dispatch(engine, request).await;
    framing_async::write_message(&mut stream, &response).await
}

/// Applies one request to the engine.
pub async fn dispatch<R, C>(engine: &SyncEngine<R, C>, request: DaemonRequest) -> DaemonResponse
where
    R: RemoteAuthority,
    C: ClockSource,
{
    debug!(?request, "ipc request");
    let result = match request {
        DaemonRequest::Ping => Ok(DaemonResponse::Pong),
        DaemonRequest::Status => Ok(DaemonResponse::Status { status: engine.snapshot() }),
        DaemonRequest::List { filter } => {
            Ok(DaemonResponse::Records { records: engine.list(&filter) })
        }
        DaemonRequest::Enqueue { kind, owner_id, payload } => engine
            .enqueue(kind, payload, &owner_id)
            .map(|id| DaemonResponse::Enqueued { id }),
        DaemonRequest::Resolve { id, resolution, payload } => engine
            .resolve_conflict(&id, resolution, payload)
            .map(|resolved| DaemonResponse::Resolved { resolved }),
        DaemonRequest::Retry { id } => {
            engine.retry_failed(&id).map(|record| DaemonResponse::Retried { record })
        }
        DaemonRequest::RetryAll => {
            engine.retry_all_failed().map(|count| DaemonResponse::RetriedAll { count })
        }
        DaemonRequest::Cleanup { older_than_days } => {
            engine.cleanup(older_than_days).map(|report| DaemonResponse::Cleanup { report })
        }
        DaemonRequest::GetConfig => Ok(DaemonResponse::Config { config: engine.config() }),
        DaemonRequest::UpdateConfig { patch } => {
            engine.update_config(&patch).map(|config| DaemonResponse::Config { config })
        }
        DaemonRequest::SyncNow => {
            engine.sync_now().await.map(|report| DaemonResponse::Pass { report })
        }
    };

    result.unwrap_or_else(|e| DaemonResponse::Error { message: e.to_string() })
}
