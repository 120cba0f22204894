use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, trace, warn};

use crate::error::{LedgerError, Result};
use crate::loader::RecordSource;
use crate::record::{Snapshot, SnapshotIdentity};
use crate::store::RecordStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one poll of the source.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// Identity matches the published snapshot; nothing was read.
    Unchanged,
    /// A new record set was published. `rows` may be zero when the workbook
    /// no longer has a usable year sheet.
    Reloaded {
        identity: SnapshotIdentity,
        rows: usize,
    },
    /// The reload failed; the previously published snapshot stays in effect.
    Failed { error: LedgerError },
}

impl ReloadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReloadOutcome::Failed { .. })
    }
}

pub type ReloadHook = Arc<dyn Fn(&ReloadOutcome) + Send + Sync>;

/// Default observability hook: logs each outcome through `tracing`.
pub fn log_outcome(outcome: &ReloadOutcome) {
    match outcome {
        ReloadOutcome::Unchanged => trace!("source unchanged"),
        ReloadOutcome::Reloaded { identity, rows: 0 } => {
            warn!(%identity, "reloaded source has no usable year sheet")
        }
        ReloadOutcome::Reloaded { identity, rows } => {
            info!(%identity, rows, "reloaded source after change")
        }
        ReloadOutcome::Failed { error } => {
            warn!(error = %error, "reload failed, keeping previous records")
        }
    }
}

/// Loads the source synchronously and publishes it. Used once at startup,
/// where a missing file or a workbook without any usable sheet is fatal.
/// Later reloads publish an empty set like any other.
pub fn load_initial<S: RecordSource + ?Sized>(
    source: &S,
    store: &RecordStore,
) -> Result<Arc<Snapshot>> {
    let snapshot = source.load()?;
    if snapshot.records.is_empty() {
        return Err(LedgerError::EmptyCorpus(source.location()));
    }
    Ok(store.publish_snapshot(snapshot))
}

/// Polls a source and republishes it into the store whenever its identity
/// changes.
pub struct Watcher<S> {
    source: Arc<S>,
    store: Arc<RecordStore>,
    interval: Duration,
    hook: ReloadHook,
}

impl<S: RecordSource + 'static> Watcher<S> {
    pub fn new(source: Arc<S>, store: Arc<RecordStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval,
            hook: Arc::new(log_outcome),
        }
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ReloadOutcome) + Send + Sync + 'static,
    {
        self.hook = Arc::new(hook);
        self
    }

    /// Runs one poll and reports the outcome to the hook.
    pub fn tick(&self) -> ReloadOutcome {
        let outcome = self.poll();
        (self.hook)(&outcome);
        outcome
    }

    fn poll(&self) -> ReloadOutcome {
        let identity = match self.source.identity() {
            Ok(identity) => identity,
            Err(error) => return ReloadOutcome::Failed { error },
        };
        if self.store.identity() == Some(identity) {
            return ReloadOutcome::Unchanged;
        }
        debug!(%identity, "source changed, reloading");
        match self.source.load() {
            Ok(snapshot) => {
                let identity = snapshot.identity;
                let rows = snapshot.records.len();
                self.store.publish_snapshot(snapshot);
                ReloadOutcome::Reloaded { identity, rows }
            }
            Err(error) => ReloadOutcome::Failed { error },
        }
    }

    /// Starts polling on a background thread.
    pub fn spawn(self) -> WatcherHandle {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let thread = thread::spawn(move || {
            info!(interval_ms = self.interval.as_millis() as u64, "watching source");
            while !thread_signal.wait(self.interval) {
                self.tick();
            }
            debug!("watcher stopped");
        });
        WatcherHandle {
            signal,
            thread: Some(thread),
        }
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    /// Sleeps for `timeout` or until stopped. Returns whether stop was
    /// requested.
    fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.condvar.wait_for(&mut stopped, timeout);
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }
}

/// Running watcher thread. Dropping the handle stops the thread.
pub struct WatcherHandle {
    signal: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.signal.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("watcher thread panicked");
            }
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
