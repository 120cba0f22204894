use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::record::{RecordSet, Snapshot, SnapshotIdentity};

#[derive(Default)]
struct Published {
    snapshot: Option<Arc<Snapshot>>,
    generation: u64,
}

/// Holds the currently published snapshot.
///
/// Readers take a clone of the `Arc` and work on it without holding any
/// lock; `publish` swaps the pointer. A reader therefore sees either the old
/// snapshot or the new one, never a mix. The publish counter lives under the
/// same lock, so a snapshot and its generation are always read together.
#[derive(Default)]
pub struct RecordStore {
    current: RwLock<Published>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published snapshot, or `None` before the first successful load.
    pub fn get_current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().snapshot.clone()
    }

    /// The published snapshot together with the publish that installed it.
    pub fn current_with_generation(&self) -> Option<(Arc<Snapshot>, u64)> {
        let published = self.current.read();
        published
            .snapshot
            .clone()
            .map(|snapshot| (snapshot, published.generation))
    }

    pub fn publish(&self, records: RecordSet, identity: SnapshotIdentity) -> Arc<Snapshot> {
        self.publish_snapshot(Snapshot { records, identity })
    }

    pub fn publish_snapshot(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let rows = snapshot.records.len();
        let identity = snapshot.identity;
        let generation = {
            let mut published = self.current.write();
            published.snapshot = Some(Arc::clone(&snapshot));
            published.generation += 1;
            published.generation
        };
        info!(rows, %identity, generation, "published record set");
        snapshot
    }

    /// Current identity, if anything has been published.
    pub fn identity(&self) -> Option<SnapshotIdentity> {
        self.current
            .read()
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.identity)
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }
}
