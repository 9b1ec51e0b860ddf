use std::sync::Arc;

use core_sim::MarketSnapshot;
use tokio::sync::watch;

/// Write side of the snapshot channel. Held only by the engine.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<MarketSnapshot>>,
}

impl SnapshotPublisher {
    /// Replaces the current snapshot. Readers only ever swap an `Arc` under the
    /// channel lock, so publishing never waits on a reader copying state.
    pub fn publish(&self, snapshot: MarketSnapshot) {
        debug_assert!(snapshot.step >= self.tx.borrow().step);
        self.tx.send_replace(Arc::new(snapshot));
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side shared by the query interface and chart feeds.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<MarketSnapshot>>,
}

impl SnapshotReader {
    /// Reader over a snapshot that will never change.
    pub fn fixed(snapshot: MarketSnapshot) -> Self {
        let (_publisher, reader) = snapshot_channel(snapshot);
        reader
    }

    /// Shared handle to the latest completed tick.
    pub fn latest(&self) -> Arc<MarketSnapshot> {
        Arc::clone(&self.rx.borrow())
    }

    /// Independent deep copy of the latest completed tick. The copy happens outside
    /// the channel lock.
    pub fn read(&self) -> MarketSnapshot {
        MarketSnapshot::clone(&self.latest())
    }

    pub fn step(&self) -> u64 {
        self.rx.borrow().step
    }

    /// Waits for a snapshot newer than the last one this reader saw through `changed`.
    /// Returns `None` once the engine is gone; `read` keeps serving the final state.
    pub async fn changed(&mut self) -> Option<Arc<MarketSnapshot>> {
        self.rx.changed().await.ok()?;
        Some(Arc::clone(&self.rx.borrow_and_update()))
    }
}

pub fn snapshot_channel(initial: MarketSnapshot) -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = watch::channel(Arc::new(initial));
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}
