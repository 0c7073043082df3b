//! Filesystem synchronizer: keeps a [`GraphStore`] in step with its
//! directory.
//!
//! A `notify` watcher feeds a bounded queue; one worker thread debounces
//! bursts, reloads the store and pushes a [`StoreChanged`] to every
//! subscriber.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use crate::error::{Result, Warning};
use crate::id;
use crate::store::GraphStore;

/// How often the idle worker checks the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Synchronizer settings.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Window after the first event of a burst before reloading.
    pub debounce: Duration,
    /// Capacity of the raw event queue; extra events inside a pending
    /// window are dropped.
    pub queue_capacity: usize,
    /// Capacity of each subscriber channel.
    pub subscriber_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            queue_capacity: 256,
            subscriber_capacity: 16,
        }
    }
}

/// Sent to subscribers after each successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChanged {
    pub generation: u64,
    pub records: usize,
}

type Subscribers = Arc<Mutex<Vec<SyncSender<StoreChanged>>>>;

struct Running {
    watcher: RecommendedWatcher,
    stop: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// Watches a store's root directory and reloads the store on change.
pub struct Synchronizer {
    store: Arc<GraphStore>,
    config: WatchConfig,
    subscribers: Subscribers,
    running: Option<Running>,
}

impl Synchronizer {
    #[must_use]
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self::with_config(store, WatchConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<GraphStore>, config: WatchConfig) -> Self {
        Self {
            store,
            config,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            running: None,
        }
    }

    /// Register for change notifications.
    ///
    /// A subscriber that falls behind misses notifications rather than
    /// blocking the worker. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<StoreChanged> {
        let (tx, rx) = mpsc::sync_channel(self.config.subscriber_capacity);
        self.subscribers.lock().push(tx);
        rx
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start watching. Failure to set up the watch is not fatal: it comes
    /// back as a `WatchUnavailable` warning and the store stays usable
    /// without live updates.
    pub fn start(&mut self) -> Vec<Warning> {
        if self.running.is_some() {
            return Vec::new();
        }

        match self.spawn() {
            Ok(running) => {
                tracing::info!(root = %self.store.root().display(), "Watching for changes");
                self.running = Some(running);
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "File watch unavailable");
                vec![Warning::WatchUnavailable {
                    reason: err.to_string(),
                }]
            }
        }
    }

    fn spawn(&self) -> Result<Running> {
        let (tx, rx) = mpsc::sync_channel::<()>(self.config.queue_capacity);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event) => {
                    // A full queue already has a reload pending.
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(error = %err, "Watch event error"),
            },
            Config::default(),
        )?;
        watcher.watch(self.store.root(), RecursiveMode::Recursive)?;

        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let store = Arc::clone(&self.store);
            let subscribers = Arc::clone(&self.subscribers);
            let stop = Arc::clone(&stop);
            let debounce = self.config.debounce;
            thread::Builder::new()
                .name("beans-watch".to_string())
                .spawn(move || run_worker(&store, &subscribers, &rx, &stop, debounce))?
        };

        Ok(Running {
            watcher,
            stop,
            worker,
        })
    }

    /// Stop watching. Safe to call repeatedly or without a prior `start`.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.stop.store(true, Ordering::SeqCst);
        drop(running.watcher);
        if running.worker.join().is_err() {
            tracing::warn!("Watch worker panicked");
        }
        tracing::debug!("Stopped watching");
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    store: &GraphStore,
    subscribers: &Subscribers,
    rx: &Receiver<()>,
    stop: &AtomicBool,
    debounce: Duration,
) {
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::SeqCst) {
                    return;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }

        // Absorb the rest of the burst until the window closes.
        let deadline = Instant::now() + debounce;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        if stop.load(Ordering::SeqCst) {
            return;
        }

        match store.load() {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    tracing::warn!(%warning, "Reload warning");
                }
                let change = StoreChanged {
                    generation: store.all().generation(),
                    records: outcome.value,
                };
                tracing::debug!(generation = change.generation, "Reloaded after change");
                notify_all(subscribers, change);
            }
            Err(err) => tracing::warn!(error = %err, "Reload failed"),
        }
    }
}

fn notify_all(subscribers: &Subscribers, change: StoreChanged) {
    subscribers.lock().retain(|tx| match tx.try_send(change) {
        Ok(()) | Err(TrySendError::Full(_)) => true,
        Err(TrySendError::Disconnected(_)) => false,
    });
}

fn is_relevant(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| is_watched_file(path))
}

fn is_watched_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    !hidden && id::is_bean_file(path)
}
