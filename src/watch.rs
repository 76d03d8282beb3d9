//! File system watcher for live reload.
//!
//! Monitors the posts, pages and static directories (plus `site.toml`) and
//! rebuilds the whole site after each burst of changes.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────┐    ┌─────────────────┐
//! │  notify  │───▶│ Debouncer │───▶│  build_site  │───▶│ hub.broadcast() │
//! │  events  │    │  (300ms)  │    │ (full, sync) │    │                 │
//! └──────────┘    └───────────┘    └──────────────┘    └─────────────────┘
//! ```
//!
//! Batches are handled one at a time on the watcher thread, so rebuilds
//! never overlap. A failed rebuild is logged and the loop carries on.

use crate::config::{self, CONFIG_FILE, SiteConfig};
use crate::generate::build_site;
use crate::imaging::ImageBackend;
use crate::livereload::{ReloadHub, Transport};
use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

const DEBOUNCE_MS: u64 = 300;

/// Longest wait while idle, so a shutdown request is noticed promptly.
const IDLE_TICK_MS: u64 = 250;

pub type EventReceiver = Receiver<notify::Result<Event>>;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Batches rapid file events.
struct Debouncer {
    pending: BTreeSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_TICK_MS)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Start watching the site's sources. Directories that don't exist are
/// skipped. The watcher must be kept alive for events to keep arriving.
pub fn start_watcher(
    config: &SiteConfig,
    root: &Path,
) -> notify::Result<(RecommendedWatcher, EventReceiver)> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)?;

    let paths = config.paths.resolve(root);
    for dir in paths.watched() {
        if dir.is_dir() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            info!("Watching {}", dir.display());
        }
    }
    let config_file = root.join(CONFIG_FILE);
    if config_file.is_file() {
        watcher.watch(&config_file, RecursiveMode::NonRecursive)?;
    }
    Ok((watcher, rx))
}

/// Rebuild after every debounced batch until `shutdown` is raised or the
/// watcher goes away.
pub fn rebuild_loop<T: Transport>(
    rx: &EventReceiver,
    config: &SiteConfig,
    root: &Path,
    backend: &impl ImageBackend,
    hub: &ReloadHub<T>,
    shutdown: &AtomicBool,
) {
    let mut debouncer = Debouncer::new();

    while !shutdown.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("Watch error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_batch(&debouncer.take(), config, root, backend, hub);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Watch loop stopped");
}

/// Rebuild the site for one batch of changed paths, then tell every open
/// tab to reload. Returns how many tabs were reached.
///
/// `site.toml` is re-read first; an invalid file keeps the previous config.
pub fn handle_batch<T: Transport>(
    changed: &[PathBuf],
    config: &SiteConfig,
    root: &Path,
    backend: &impl ImageBackend,
    hub: &ReloadHub<T>,
) -> usize {
    for path in changed {
        debug!("Changed: {}", path.display());
    }
    info!("{} file(s) changed, rebuilding...", changed.len());

    let reloaded;
    let config = match config::load_config(root) {
        Ok(fresh) => {
            reloaded = fresh;
            &reloaded
        }
        Err(e) => {
            warn!("Keeping previous config: {e}");
            config
        }
    };

    let started = Instant::now();
    match build_site(config, root, backend) {
        Ok(report) => info!(
            "Rebuilt {} posts in {:.0?}",
            report.posts.len(),
            started.elapsed()
        ),
        Err(e) => error!("Rebuild failed: {e}"),
    }
    hub.broadcast()
}
