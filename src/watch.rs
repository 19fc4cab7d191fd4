//! Watch coordinator.
//!
//! Watches the source tree and, for each changed category, runs the
//! corresponding task followed by a browser reload as a sequential pair.
//! Runs until process exit; task failures are notified and never stop the
//! coordinator.
//!
//! Raw watcher events settle for a short window before running tasks, so
//! a burst of changes to one category runs its task once. Distinct
//! categories changed in a window keep their event order.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use notify::{RecursiveMode, Watcher};

use crate::config::Config;
use crate::registry::{AssetKind, PathRegistry};
use crate::reload::ReloadHub;
use crate::task;
use crate::{debug, log};

/// Settle window after the first event before tasks run.
const SETTLE: Duration = Duration::from_millis(150);

/// Start watching the source tree and spawn the coordinator thread.
pub fn spawn(
    config: Arc<Config>,
    registry: Arc<PathRegistry>,
    hub: Arc<ReloadHub>,
) -> Result<()> {
    let (tx, rx) = channel::unbounded();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    watcher.watch(registry.source_root(), RecursiveMode::Recursive)?;

    log!("watch"; "watching {}", registry.source_root().display());

    std::thread::spawn(move || {
        // The watcher must stay alive for the lifetime of the loop
        let _watcher = watcher;
        run_loop(&rx, &config, &registry, &hub);
    });

    Ok(())
}

fn run_loop(
    rx: &Receiver<notify::Result<notify::Event>>,
    config: &Config,
    registry: &PathRegistry,
    hub: &ReloadHub,
) {
    let mut pending: Vec<AssetKind> = Vec::new();

    loop {
        if pending.is_empty() {
            match rx.recv() {
                Ok(result) => absorb(result, &mut pending, registry),
                Err(_) => break, // watcher dropped
            }
        } else {
            match rx.recv_timeout(SETTLE) {
                Ok(result) => absorb(result, &mut pending, registry),
                Err(RecvTimeoutError::Timeout) => {
                    for kind in pending.drain(..) {
                        task::run_kind(kind, registry, config.output_dir());
                        hub.broadcast_reload();
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

/// Fold a raw watcher event into the pending category list.
///
/// Categories are deduplicated; first-seen order is preserved so task+reload
/// pairs run in event order.
fn absorb(
    result: notify::Result<notify::Event>,
    pending: &mut Vec<AssetKind>,
    registry: &PathRegistry,
) {
    match result {
        Ok(event) => {
            if event.kind.is_access() {
                return;
            }
            for path in &event.paths {
                if let Some(kind) = registry.classify(path) {
                    if !pending.contains(&kind) {
                        debug!("watch"; "{}: {}", kind.name(), path.display());
                        pending.push(kind);
                    }
                }
            }
        }
        Err(e) => log!("watch"; "notify error: {}", e),
    }
}
