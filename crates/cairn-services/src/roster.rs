//! Roster — the node-local identity table.
//!
//! Authoritative view of peer identities as reported by gossip. The one
//! rule is admission: once an entry exists, an update may only replace it
//! when its key hint matches the stored one exactly (absent counts as its
//! own value). A mismatch is a silent no-op — the event-ingestion path
//! must stay non-throwing, and a stale identifier must not be hijacked by
//! a new process after a rapid rejoin.
//!
//! Entries are never aged out here; removal happens through explicit
//! eviction, driven by the resolver on terminal connection failure.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use cairn_core::peer::{PeerMeta, PeerRecord, PeerStatus, RouterId};

use crate::notifier::ChangeNotifier;

/// The identity table — shared between the gossip pump, the resolver and
/// application code. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Roster {
    entries: Arc<DashMap<RouterId, PeerRecord>>,
    notifier: ChangeNotifier,
}

impl Roster {
    pub fn new(notifier: ChangeNotifier) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            notifier,
        }
    }

    /// Apply one raw update from the gossip layer.
    ///
    /// Returns whether the update was admitted. A rejected update mutates
    /// nothing and notifies nobody. The compare-and-replace runs under the
    /// entry lock, so the admission invariant holds even when the caller
    /// runs on a parallel runtime.
    pub fn apply_update(&self, meta: PeerMeta, status: PeerStatus, host: &str) -> bool {
        let admitted = match self.entries.entry(meta.id_router.clone()) {
            Entry::Vacant(slot) => {
                let record = PeerRecord::from_meta(meta, status, host);
                slot.insert(record.clone());
                record
            }
            Entry::Occupied(mut slot) => {
                if slot.get().ec_pub_id != meta.ec_pub_id {
                    tracing::debug!(
                        id_router = %meta.id_router,
                        "update rejected: key hint does not match roster entry"
                    );
                    return false;
                }
                let record = slot.get().merged(meta, status, host);
                slot.insert(record.clone());
                record
            }
        };

        tracing::trace!(
            id_router = %admitted.id_router,
            status = %admitted.status,
            host = %admitted.host,
            "roster updated"
        );
        self.notifier.push(admitted);
        true
    }

    /// Seed the local node's own entry. Called once at construction; the
    /// gossip stream never carries the `self` status.
    pub fn seed_self(&self, meta: PeerMeta, host: &str) {
        self.apply_update(meta, PeerStatus::SelfEntry, host);
    }

    /// Current record for an identifier, if any.
    pub fn get(&self, id_router: &RouterId) -> Option<PeerRecord> {
        self.entries.get(id_router).map(|e| e.value().clone())
    }

    /// Explicit eviction. Returns the removed record, if any.
    ///
    /// Eviction targets the identifier, not a record generation: a fresher
    /// record admitted concurrently may be removed too. Acceptable under
    /// gossip's eventual consistency — the peer will be rediscovered.
    pub fn remove(&self, id_router: &RouterId) -> Option<PeerRecord> {
        let removed = self.entries.remove(id_router).map(|(_, record)| record);
        if removed.is_some() {
            tracing::debug!(id_router = %id_router, "roster entry evicted");
        }
        removed
    }

    /// Snapshot of all current records, unordered.
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
