// ── DMX port table ──
//
// Ports keyed by number plus the set of ports under local edit. Both
// live in the same snapshot so a merge sees the dirty flags it must
// respect within the same write.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{DmxPort, DmxPortStatus, PORT_COUNT, PortEdit};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DmxTable {
    ports: BTreeMap<u8, DmxPort>,
    dirty: BTreeSet<u8>,
}

impl DmxTable {
    pub fn get(&self, port: u8) -> Option<&DmxPort> {
        self.ports.get(&port)
    }

    /// Ports in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = &DmxPort> {
        self.ports.values()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// `true` while a local edit on `port` is unsaved.
    pub fn is_dirty(&self, port: u8) -> bool {
        self.dirty.contains(&port)
    }

    pub fn dirty_ports(&self) -> impl Iterator<Item = u8> + '_ {
        self.dirty.iter().copied()
    }

    // ── Server-side writes ───────────────────────────────────────────

    /// Replace the table with a full port list.
    ///
    /// Ports missing from the list are pruned unless dirty. Dirty ports
    /// keep their editable fields; their counters still update.
    pub(crate) fn apply_list(&mut self, list: &[DmxPortStatus]) {
        let mut next = BTreeMap::new();
        for status in list {
            if !in_range(status.port) {
                continue;
            }
            let port = match self.ports.get(&status.port) {
                Some(existing) if self.is_dirty(status.port) => {
                    let mut kept = existing.clone();
                    kept.merge_status(status, true);
                    kept
                }
                _ => DmxPort::from(status),
            };
            next.insert(status.port, port);
        }
        for &dirty in &self.dirty {
            if !next.contains_key(&dirty) {
                if let Some(existing) = self.ports.get(&dirty) {
                    debug!(port = dirty, "keeping port under edit absent from list");
                    next.insert(dirty, existing.clone());
                }
            }
        }
        self.ports = next;
    }

    /// Merge a single-port delta. Unknown ports are inserted with defaults.
    /// Returns `false` when the delta was dropped.
    pub(crate) fn apply_delta(&mut self, status: &DmxPortStatus) -> bool {
        if !in_range(status.port) {
            return false;
        }
        let keep_local = self.is_dirty(status.port);
        self.ports
            .entry(status.port)
            .or_insert_with(|| DmxPort::new(status.port))
            .merge_status(status, keep_local);
        true
    }

    // ── Local edits ──────────────────────────────────────────────────

    /// Mark `port` dirty. Returns `false` if it already was.
    pub(crate) fn begin_edit(&mut self, port: u8) -> bool {
        self.dirty.insert(port)
    }

    /// Apply local values and mark dirty.
    pub(crate) fn edit(&mut self, port: u8, edit: &PortEdit) {
        self.dirty.insert(port);
        let entry = self
            .ports
            .entry(port)
            .or_insert_with(|| DmxPort::new(port));
        edit.apply_to(entry);
    }

    /// Drop the dirty flag so the next server value is accepted.
    /// Returns `false` if the port was not dirty.
    pub(crate) fn clear_dirty(&mut self, port: u8) -> bool {
        self.dirty.remove(&port)
    }
}

fn in_range(port: u8) -> bool {
    if port < PORT_COUNT {
        true
    } else {
        warn!(port, "dropping status for out-of-range DMX port");
        false
    }
}
