// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running scheduler: `syncq run`.
//!
//! Holds the work directory lock, probes the remote, runs scheduled passes,
//! and flushes the queue whenever connectivity comes back. Other syncq
//! commands reach the engine through a socket in the work directory while
//! this runs. Ctrl-C stops the timer, waits for any pass in flight, and makes
//! one last attempt to drain pending records before exiting.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{acquire_lock, runtime, Context};
use crate::config::{log_path, socket_path};
use crate::daemon::spawn_server;
use crate::error::{Error, Result};
use crate::logging;
use crate::sync::{probe_target, spawn_probe, Scheduler};

pub fn run(log_file: bool) -> Result<()> {
    let ctx = Context::load()?;
    let log = log_file.then(|| log_path(&ctx.work_dir));
    logging::init(logging::VERBOSE, log.as_deref());

    let _lock = acquire_lock(&ctx.work_dir)?;
    let engine = Arc::new(ctx.open_engine()?);
    let target = ctx.remote_url().map(|url| probe_target(&url)).transpose()?;
    let probe_interval = ctx.config.probe_interval();
    let socket = socket_path(&ctx.work_dir);

    // Left behind by a runner that did not shut down cleanly.
    let _ = fs::remove_file(&socket);

    let served = runtime()?.block_on(async {
        let listener = UnixListener::bind(&socket)?;
        info!(socket = %socket.display(), "accepting commands");

        let cancel = CancellationToken::new();
        let scheduler = Arc::new(Scheduler::new(Arc::clone(&engine)));

        let mut tasks = vec![
            spawn_server(listener, Arc::clone(&engine), cancel.clone()),
            scheduler.watch_connectivity(engine.connectivity_events(), cancel.clone()),
            scheduler.follow_config(engine.config_watch(), cancel.clone()),
        ];

        match target {
            Some(target) => {
                let probed = Arc::clone(&engine);
                tasks.push(spawn_probe(
                    target,
                    probe_interval,
                    engine.options().commit_timeout,
                    cancel.clone(),
                    move |online| {
                        probed.set_online(online);
                    },
                ));
            }
            None => {
                warn!("no remote configured, records will stay queued");
                engine.set_online(false);
            }
        }

        let _status = engine.subscribe_fn(|status| {
            info!(
                online = status.is_online,
                pending = status.pending_count,
                conflicts = status.conflict_count,
                failed = status.failed_count,
                bytes = status.total_bytes,
                "status"
            );
        })?;

        let interval = Duration::from_millis(engine.config().sync_interval_ms);
        scheduler.start(interval).await;

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c, shutting down");
        }
        info!("shutting down");

        cancel.cancel();
        engine.request_stop();
        scheduler.stop().await;

        if engine.is_online() && engine.snapshot().pending_count > 0 {
            let timeout = engine.options().commit_timeout;
            match tokio::time::timeout(timeout, engine.sync_now()).await {
                Ok(Ok(report)) => info!(
                    succeeded = report.succeeded,
                    remaining = report.remaining,
                    "final flush"
                ),
                Ok(Err(e)) => warn!(error = %e, "final flush failed"),
                Err(_) => warn!("final flush timed out"),
            }
        }

        for task in tasks {
            let _ = task.await;
        }
        Ok::<_, Error>(())
    });

    let _ = fs::remove_file(&socket);
    served
}
