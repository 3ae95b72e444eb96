//! # Live Mirror
//!
//! Keeps an always-current [`Snapshot`] of the items and locations
//! collections and hands every new snapshot to its subscribers.
//!
//! ## Mirror Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         LiveMirror                                      │
//! │                                                                         │
//! │   DocumentStore                                                         │
//! │   ├── observe("items") ──────▶ pump task ──┐                            │
//! │   └── observe("locations") ──▶ pump task ──┤                            │
//! │                                            ▼                            │
//! │                          ┌────────────────────────────────┐             │
//! │                          │ Shared (std Mutex)             │             │
//! │                          │  released: bool                │             │
//! │                          │  snapshot: Arc<Snapshot>       │             │
//! │                          │  subscribers: Vec<Sender>      │             │
//! │                          └───────────────┬────────────────┘             │
//! │                                          │ one emission per             │
//! │                                          │ notification, per subscriber │
//! │                                          ▼                              │
//! │                               SnapshotFeed, SnapshotFeed, ...           │
//! │                                                                         │
//! │   MirrorHandle::release() / drop                                        │
//! │     sets `released` under the lock, drops subscribers, aborts pumps.    │
//! │     A notification that races a release sees `released` and is          │
//! │     discarded.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Notifications from one collection are applied strictly in arrival order.
//! The two collections are pumped independently, so the relative order of
//! an items notification and a locations notification is whatever order the
//! pumps get scheduled in.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

use tally_core::{Collection, Record, Snapshot};

use crate::error::LiveResult;
use crate::store::{DocumentStore, RecordFeed};

// =============================================================================
// Snapshot Feed
// =============================================================================

/// Receives snapshots from a mirror. The first message is the snapshot
/// current at subscription time.
///
/// The feed ends when the mirror is released.
pub struct SnapshotFeed {
    rx: mpsc::UnboundedReceiver<Arc<Snapshot>>,
}

impl SnapshotFeed {
    /// Waits for the next snapshot. `None` once the mirror is released and
    /// everything buffered has been read.
    pub async fn next(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.recv().await
    }

    /// Returns a buffered snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Arc<Snapshot>> {
        self.rx.try_recv().ok()
    }

    /// Waits for the first snapshot with both collections loaded.
    pub async fn next_live(&mut self) -> Option<Arc<Snapshot>> {
        while let Some(snapshot) = self.next().await {
            if snapshot.is_live() {
                return Some(snapshot);
            }
        }
        None
    }

    /// Converts the feed into a [`tokio_stream::Stream`].
    pub fn into_stream(self) -> UnboundedReceiverStream<Arc<Snapshot>> {
        UnboundedReceiverStream::new(self.rx)
    }
}

// =============================================================================
// Shared State
// =============================================================================

struct MirrorInner {
    released: bool,
    snapshot: Arc<Snapshot>,
    subscribers: Vec<mpsc::UnboundedSender<Arc<Snapshot>>>,
    pumps: Vec<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<MirrorInner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MirrorInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Applies one notification. Returns false once released.
    fn apply(&self, collection: Collection, records: &[Record]) -> bool {
        let mut inner = self.lock();
        if inner.released {
            debug!(%collection, "Notification after release discarded");
            return false;
        }

        let next = Arc::new(inner.snapshot.replace(collection, records));
        debug!(
            %collection,
            revision = next.revision,
            items = next.items.len(),
            locations = next.locations.len(),
            "Snapshot replaced"
        );

        inner.subscribers.retain(|tx| tx.send(next.clone()).is_ok());
        inner.snapshot = next;
        true
    }
}

// =============================================================================
// Live Mirror
// =============================================================================

/// Entry point for mirroring a document store.
pub struct LiveMirror;

impl LiveMirror {
    /// Subscribes to both collections and starts mirroring.
    ///
    /// The returned handle owns the subscriptions. Releasing or dropping it
    /// stops all further emissions.
    pub async fn observe(store: Arc<dyn DocumentStore>) -> LiveResult<MirrorHandle> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(MirrorInner {
                released: false,
                snapshot: Arc::new(Snapshot::empty()),
                subscribers: Vec::new(),
                pumps: Vec::new(),
            }),
        });

        // Subscribe to everything first so a failure leaves no task behind
        let mut feeds = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            feeds.push((collection, store.observe(collection.name()).await?));
        }

        let pumps = feeds
            .into_iter()
            .map(|(collection, feed)| tokio::spawn(pump(shared.clone(), collection, feed)))
            .collect();
        shared.lock().pumps = pumps;

        info!("Live mirror started");
        Ok(MirrorHandle { shared })
    }
}

async fn pump(shared: Arc<Shared>, collection: Collection, mut feed: RecordFeed) {
    while let Some(records) = feed.recv().await {
        if !shared.apply(collection, &records) {
            break;
        }
    }
    debug!(%collection, "Mirror pump stopped");
}

// =============================================================================
// Mirror Handle
// =============================================================================

/// Owns a running mirror.
pub struct MirrorHandle {
    shared: Arc<Shared>,
}

impl MirrorHandle {
    /// Most recent snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.lock().snapshot.clone()
    }

    /// Opens a feed of snapshots, starting with the current one.
    ///
    /// After release this returns a feed that is already closed.
    pub fn subscribe(&self) -> SnapshotFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.shared.lock();
        if !inner.released {
            let _ = tx.send(inner.snapshot.clone());
            inner.subscribers.push(tx);
        }
        SnapshotFeed { rx }
    }

    /// Stops the mirror. Safe to call more than once.
    pub fn release(&self) {
        let mut inner = self.shared.lock();
        if inner.released {
            return;
        }
        inner.released = true;
        inner.subscribers.clear();
        for pump in inner.pumps.drain(..) {
            pump.abort();
        }
        info!(revision = inner.snapshot.revision, "Live mirror released");
    }

    /// Returns true once [`release`](Self::release) has run.
    pub fn is_released(&self) -> bool {
        self.shared.lock().released
    }
}

impl Drop for MirrorHandle {
    fn drop(&mut self) {
        self.release();
    }
}
