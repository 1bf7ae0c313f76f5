// ── Reactive snapshot streams ──
//
// Subscription handles vended by the domain stores.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::DomainSnapshot;

/// A subscription to one domain store.
///
/// Gives point-in-time access plus change notification, either through
/// [`changed`](Self::changed) or as a `Stream`.
pub struct SnapshotStream<T: Clone + Send + Sync + 'static> {
    current: DomainSnapshot<T>,
    receiver: watch::Receiver<DomainSnapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> SnapshotStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<DomainSnapshot<T>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot seen at creation or at the last `changed()`.
    pub fn current(&self) -> &DomainSnapshot<T> {
        &self.current
    }

    /// The latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> DomainSnapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next write. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<DomainSnapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` yielding the current snapshot and then every write.
    pub fn into_stream(self) -> SnapshotWatchStream<T> {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the store's `watch::Receiver`.
pub struct SnapshotWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<DomainSnapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for SnapshotWatchStream<T> {
    type Item = DomainSnapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
