// Copyright © 2024 Leafpress. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Source Watcher
//!
//! Watches the source tree with `notify` and runs a full rebuild after
//! each burst of changes. Events are collected until the tree has been
//! quiet for [`DEBOUNCE`], so an editor saving several files at once
//! costs one rebuild. A failed rebuild is logged and the watcher keeps
//! running.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::output::resolve_existing;
use crate::{LeafpressError, Result};

/// Quiet period that ends a burst of changes.
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// How long to block while nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Watches `source` and calls `rebuild` after each burst of changes.
///
/// Paths below any of `ignore` (typically an output directory nested in
/// the source tree) never trigger a rebuild. Blocks until the watcher
/// shuts down.
///
/// # Errors
///
/// Fails when the watcher cannot be created or attached to `source`.
pub fn watch_for_changes<F>(source: &Path, ignore: &[PathBuf], mut rebuild: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let source = resolve_existing(source);
    let ignore: Vec<PathBuf> = ignore.iter().map(|p| resolve_existing(p)).collect();

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).map_err(|e| {
        LeafpressError::internal_error(format!("Failed to create file watcher: {}", e))
    })?;
    watcher
        .watch(&source, RecursiveMode::Recursive)
        .map_err(|e| {
            LeafpressError::internal_error(format!(
                "Failed to watch {}: {}",
                source.display(),
                e
            ))
        })?;

    info!("Watching {} for changes", source.display());

    let mut changes = ChangeSet::new(ignore);
    loop {
        match rx.recv_timeout(changes.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => changes.add(event.paths, Instant::now()),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Watch error: {}", e),
            Err(RecvTimeoutError::Timeout) if changes.ready(Instant::now()) => {
                let changed = changes.take();
                info!("{} file(s) changed, rebuilding", changed.len());
                for path in &changed {
                    debug!("Changed: {}", path.display());
                }
                if let Err(e) = rebuild() {
                    error!("Rebuild failed: {}", e);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "swp" | "swo" | "swx" | "tmp" | "bak")
        || name.ends_with('~')
        || name.starts_with(".#")
}

/// Pending changes of the current burst.
#[derive(Debug)]
struct ChangeSet {
    ignore: Vec<PathBuf>,
    pending: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
}

impl ChangeSet {
    fn new(ignore: Vec<PathBuf>) -> Self {
        Self {
            ignore,
            pending: BTreeSet::new(),
            last_event: None,
        }
    }

    fn add(&mut self, paths: Vec<PathBuf>, now: Instant) {
        for path in paths {
            if is_temp_file(&path) || self.ignore.iter().any(|i| path.starts_with(i)) {
                continue;
            }
            _ = self.pending.insert(path);
            self.last_event = Some(now);
        }
    }

    fn ready(&self, now: Instant) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| now.saturating_duration_since(t) >= DEBOUNCE)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            IDLE_WAIT
        } else {
            DEBOUNCE
        }
    }
}
