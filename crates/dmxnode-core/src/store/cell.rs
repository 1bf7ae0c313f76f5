// ── Single-domain reactive container ──
//
// A `watch` channel holding the authoritative snapshot for one domain.
// Every write is one `send_modify` / `send_if_modified` call, so a
// read-merge-write can never interleave with another writer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::stream::SnapshotStream;

/// The stored view of one domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSnapshot<T> {
    /// Last good value. Survives later errors.
    pub value: Option<T>,
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Set by a failed refresh, cleared by the next good value.
    pub error: Option<String>,
}

impl<T> Default for DomainSnapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            last_updated_at: None,
            error: None,
        }
    }
}

impl<T> DomainSnapshot<T> {
    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }
}

pub struct StateCell<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<DomainSnapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(DomainSnapshot::default());
        Self { tx }
    }

    /// Current snapshot (cloned).
    pub fn get(&self) -> DomainSnapshot<T> {
        self.tx.borrow().clone()
    }

    /// Current value, if any has been received.
    pub fn value(&self) -> Option<T> {
        self.tx.borrow().value.clone()
    }

    pub fn subscribe(&self) -> SnapshotStream<T> {
        SnapshotStream::new(self.tx.subscribe())
    }

    /// Replace the value and clear any error.
    pub(crate) fn set_value(&self, value: T) {
        self.tx.send_modify(|snap| {
            snap.value = Some(value);
            snap.last_updated_at = Some(Utc::now());
            snap.error = None;
        });
    }

    /// Record a failure, keeping the last good value.
    pub(crate) fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.tx.send_if_modified(|snap| {
            if snap.error.as_deref() == Some(error.as_str()) {
                return false;
            }
            snap.error = Some(error);
            true
        });
    }

    /// Read-merge-write on the value.
    ///
    /// `f` returns whether it changed anything; only then are subscribers
    /// notified and the timestamp bumped. A write that counts as fresh data
    /// also clears the error.
    pub(crate) fn update(&self, f: impl FnOnce(&mut Option<T>) -> bool) -> bool {
        self.tx.send_if_modified(|snap| {
            let changed = f(&mut snap.value);
            if changed {
                snap.last_updated_at = Some(Utc::now());
                snap.error = None;
            }
            changed
        })
    }

    /// Mutate local-only state (edit flags) without treating it as fresh data.
    pub(crate) fn modify_local(&self, f: impl FnOnce(&mut Option<T>) -> bool) -> bool {
        self.tx.send_if_modified(|snap| f(&mut snap.value))
    }
}
