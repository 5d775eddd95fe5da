//! Watch loop: mirrors every registered source folder to its destination
//! whenever something under the source changes.
//!
//! One notify watcher and one worker thread per folder pair. The worker
//! blocks on its channel and runs the full mirror sync for each relevant
//! event, or once per quiet window when a debounce is configured. The
//! caller's thread only polls for shutdown.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use snafu::ResultExt;

use crate::error::{Result, WatchSnafu};
use crate::folders::FolderPair;
use crate::notice::{DesktopNotifier, Notifier};
use crate::sync::Mirror;

/// Destinations whose final path segment names no mounted favorite.
///
/// A destination ending in `ignore` is never reported.
pub fn unplugged_targets<'a>(
    pairs: &'a [FolderPair],
    mounted_labels: &[String],
    ignore: &str,
) -> Vec<&'a Path> {
    pairs
        .iter()
        .map(|p| p.destination.as_path())
        .filter(|dest| {
            let name = dest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name != ignore && !mounted_labels.iter().any(|l| *l == name)
        })
        .collect()
}

/// Events that change the source tree. Creation is included because a new
/// file also modifies its parent directory.
fn triggers_sync(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Create(_) | EventKind::Any
    )
}

/// A live subscription for one folder pair.
pub struct Subscription {
    pub pair: FolderPair,
    watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

/// All subscriptions started by [`WatchLoop::start`].
pub struct RunningWatch {
    subscriptions: Vec<Subscription>,
}

impl RunningWatch {
    /// Drops every watcher, which closes the worker channels, then waits
    /// for the workers to drain.
    pub fn stop(self) {
        let mut workers = Vec::with_capacity(self.subscriptions.len());
        for sub in self.subscriptions {
            drop(sub.watcher);
            workers.push((sub.pair.source, sub.worker));
        }
        for (source, worker) in workers {
            if worker.join().is_err() {
                error!("worker for {} panicked", source.display());
            }
        }
    }
}

pub struct WatchLoop {
    mirror: Mirror,
    notifier: Arc<dyn Notifier>,
    desktop: DesktopNotifier,
    debounce: Option<Duration>,
    poll_interval: Duration,
}

impl WatchLoop {
    pub fn new(
        mirror: Mirror,
        notifier: Arc<dyn Notifier>,
        desktop: DesktopNotifier,
        debounce: Option<Duration>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            mirror,
            notifier,
            desktop,
            debounce,
            poll_interval,
        }
    }

    /// Warns about every destination whose USB target is not mounted.
    pub fn check_media(&self, pairs: &[FolderPair], mounted_labels: &[String], ignore: &str) {
        for dest in unplugged_targets(pairs, mounted_labels, ignore) {
            self.notifier.warning(&format!(
                "Backing up data to: {} but the USB is not plugged.",
                dest.display()
            ));
            self.notifier
                .warning("Insert the USB first before starting the watcher!");
        }
    }

    /// Performs the startup check and subscribes to every pair.
    pub fn start(
        &self,
        pairs: &[FolderPair],
        mounted_labels: &[String],
        ignore: &str,
    ) -> Result<RunningWatch> {
        let mut subscriptions = Vec::with_capacity(pairs.len());
        for pair in pairs {
            self.notifier.info(&format!(
                "watching folder: {}\n\t -> backing up to: {}",
                pair.source.display(),
                pair.destination.display()
            ));
            subscriptions.push(self.subscribe(pair)?);
            self.check_media(std::slice::from_ref(pair), mounted_labels, ignore);
        }
        Ok(RunningWatch { subscriptions })
    }

    /// Syncs once, announces the subscription and starts its worker.
    pub fn subscribe(&self, pair: &FolderPair) -> Result<Subscription> {
        if let Err(e) = self.mirror.sync(&pair.source, &pair.destination) {
            warn!("initial sync of {} failed: {}", pair.source.display(), e);
        }

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default()).context(WatchSnafu {
            path: &pair.source,
        })?;
        watcher
            .watch(&pair.source, RecursiveMode::Recursive)
            .context(WatchSnafu {
                path: &pair.source,
            })?;

        self.desktop.popup(
            "WATCHDOG ON",
            &format!("Start monitoring the files on: {}", pair.source.display()),
        );

        let mirror = self.mirror.clone();
        let debounce = self.debounce;
        let worker_pair = pair.clone();
        let worker = thread::Builder::new()
            .name(format!("watch:{}", pair.source.display()))
            .spawn(move || run_worker(rx, &mirror, &worker_pair, debounce))
            .map_err(|e| crate::Error::Watch {
                path: pair.source.clone(),
                source: notify::Error::io(e),
            })?;

        Ok(Subscription {
            pair: pair.clone(),
            watcher,
            worker,
        })
    }

    /// Polls `stop` every poll interval, then shuts the subscriptions down.
    pub fn run_until(&self, running: RunningWatch, stop: impl Fn() -> bool) {
        while !stop() {
            thread::sleep(self.poll_interval);
        }
        info!("stopping {} watch subscription(s)", running.subscriptions.len());
        running.stop();
    }
}

fn sync_pair(mirror: &Mirror, pair: &FolderPair) {
    if let Err(e) = mirror.sync(&pair.source, &pair.destination) {
        error!("sync of {} failed: {}", pair.source.display(), e);
    }
}

fn run_worker(
    rx: Receiver<notify::Result<Event>>,
    mirror: &Mirror,
    pair: &FolderPair,
    debounce: Option<Duration>,
) {
    let mut pending = false;
    let mut deadline = Instant::now();

    loop {
        let received = match debounce {
            Some(_) if pending => {
                rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            _ => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(event)) => {
                debug!("raw notify event: {:?}", event);
                if !triggers_sync(&event.kind) {
                    continue;
                }
                match debounce {
                    None => sync_pair(mirror, pair),
                    Some(window) => {
                        pending = true;
                        deadline = Instant::now() + window;
                    }
                }
            }
            Ok(Err(e)) => warn!("watcher error on {}: {}", pair.source.display(), e),
            Err(RecvTimeoutError::Timeout) => {
                sync_pair(mirror, pair);
                pending = false;
            }
            Err(RecvTimeoutError::Disconnected) => {
                if pending {
                    sync_pair(mirror, pair);
                }
                debug!("watch channel for {} closed", pair.source.display());
                break;
            }
        }
    }
}
