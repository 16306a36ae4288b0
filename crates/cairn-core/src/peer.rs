//! Membership record model — what the roster stores per peer.
//!
//! A peer is known by its hub-assigned `RouterId`. The gossip layer
//! disseminates each node's metadata map; the fields we care about
//! (`id_router`, `ec_pub_id`, `channel`) are lifted out, everything else
//! rides along as opaque application metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Stable identifier naming a routing endpoint within the hub.
///
/// Assigned by the hub at startup, immutable for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouterId(String);

impl RouterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Optional credential hint (`ec_pub_id`): a base64-encoded public key
/// fragment acting as a weak identity proof.
///
/// Once a roster entry carries a key hint, updates with a different hint
/// (or none at all) are refused — a rejoining process cannot hijack a
/// stale identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyHint(String);

impl KeyHint {
    pub fn new(hint: impl Into<String>) -> Self {
        Self(hint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyHint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Last known liveness state of a peer.
///
/// `SelfEntry` marks the local node's own roster entry, seeded once at
/// startup and never touched by the gossip stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerStatus {
    Alive,
    Suspect,
    Dead,
    #[serde(rename = "self")]
    SelfEntry,
}

impl PeerStatus {
    /// Map the gossip layer's numeric state code. The wire order is
    /// fixed by the protocol: 0 = alive, 1 = suspect, 2 = dead.
    pub fn from_state_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PeerStatus::Alive),
            1 => Some(PeerStatus::Suspect),
            2 => Some(PeerStatus::Dead),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerStatus::Alive => "alive",
            PeerStatus::Suspect => "suspect",
            PeerStatus::Dead => "dead",
            PeerStatus::SelfEntry => "self",
        }
    }
}

impl fmt::Display for PeerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque application metadata fields (e.g. topic subscriptions).
pub type MetaMap = BTreeMap<String, serde_json::Value>;

/// Metadata disseminated per node through the gossip layer.
///
/// `id_router` is mandatory — an update without one cannot be keyed and
/// never reaches the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMeta {
    pub id_router: RouterId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec_pub_id: Option<KeyHint>,
    /// Connection descriptor the routing hub can dial (address URL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub extra: MetaMap,
}

impl PeerMeta {
    pub fn new(id_router: impl Into<RouterId>) -> Self {
        Self {
            id_router: id_router.into(),
            ec_pub_id: None,
            channel: None,
            extra: MetaMap::new(),
        }
    }

    pub fn with_key_hint(mut self, hint: impl Into<KeyHint>) -> Self {
        self.ec_pub_id = Some(hint.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The membership record: one per known peer, keyed by `RouterId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub id_router: RouterId,
    pub ec_pub_id: Option<KeyHint>,
    /// Connection descriptor for the resolver. Absent for peers that
    /// announced no channel; such peers can never be resolved.
    pub channel: Option<String>,
    pub extra: MetaMap,
    pub status: PeerStatus,
    /// Transport address as last reported by the gossip layer.
    pub host: String,
    pub observed_at: SystemTime,
}

impl PeerRecord {
    /// Build a fresh record from the first observed update for an id.
    pub fn from_meta(meta: PeerMeta, status: PeerStatus, host: impl Into<String>) -> Self {
        Self {
            id_router: meta.id_router,
            ec_pub_id: meta.ec_pub_id,
            channel: meta.channel,
            extra: meta.extra,
            status,
            host: host.into(),
            observed_at: SystemTime::now(),
        }
    }

    /// Build the replacement record for an admitted update.
    ///
    /// Metadata is the union of the prior record and the incoming payload;
    /// like-named incoming fields override. Status, host and timestamp
    /// always come from the incoming update.
    pub fn merged(&self, meta: PeerMeta, status: PeerStatus, host: impl Into<String>) -> Self {
        let mut extra = self.extra.clone();
        extra.extend(meta.extra);
        Self {
            id_router: meta.id_router,
            ec_pub_id: meta.ec_pub_id,
            channel: meta.channel.or_else(|| self.channel.clone()),
            extra,
            status,
            host: host.into(),
            observed_at: SystemTime::now(),
        }
    }
}

// ── Incarnation ───────────────────────────────────────────────────────────────

/// 2015-01-01T00:00:00Z in unix millis — the epoch incarnations count from.
const INCARNATION_EPOCH_MS: u64 = 1_420_070_400_000;

/// Rough time-based incarnation number for the local node.
///
/// A node that rejoins on a reused ip/port restarts with a higher
/// incarnation than anything it gossiped before, so the protocol accepts
/// its fresh state without waiting out a suspicion cycle.
pub fn incarnation() -> u64 {
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    unix_ms.saturating_sub(INCARNATION_EPOCH_MS)
}
