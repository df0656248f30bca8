//! Blacklist file watcher.
//!
//! Watches the directory holding the blacklist file (so atomic saves that
//! replace the file are seen) and reloads the [`AccessGuard`] after events
//! settle.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ AccessGuard::reload  │
//! │ events   │    │ (300ms)   │    │ (skips same content) │
//! └──────────┘    └───────────┘    └──────────────────────┘
//! ```

use crate::{content::AccessGuard, log};
use anyhow::{Context, Result, bail};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    path::Path,
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

/// Collapses bursts of events on the watched file into one reload.
struct Debouncer {
    pending: bool,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: false,
            last_event: None,
        }
    }

    fn add(&mut self) {
        self.pending = true;
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        self.pending
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> bool {
        let pending = self.pending;
        self.pending = false;
        self.last_event = None;
        pending
    }

    fn timeout(&self) -> Duration {
        if self.pending {
            Duration::from_millis(DEBOUNCE_MS)
        } else {
            Duration::from_secs(60)
        }
    }
}

/// Whether `event` touches `file`.
fn concerns(event: &Event, file: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| p.file_name() == file.file_name())
}

/// Watch the blacklist file until the event channel closes.
pub fn watch_blacklist_blocking(guard: &AccessGuard) -> Result<()> {
    let file = guard.source();
    let Some(dir) = file.parent().filter(|dir| dir.is_dir()) else {
        bail!("cannot watch {}: parent directory missing", file.display());
    };

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;
    log!("watch"; "{}", file.display());

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if concerns(&event, file) => debouncer.add(),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                if debouncer.take() && guard.reload() {
                    log!("watch"; "blacklist reloaded");
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
