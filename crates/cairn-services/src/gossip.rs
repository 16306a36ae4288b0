//! Boundary to the external gossip (SWIM-style) failure-detection layer.
//!
//! The protocol itself — probing, dissemination, suspicion — lives outside
//! this crate. Cairn consumes exactly three things from it: the local
//! node's own identity, a join primitive, and a stream of raw membership
//! events in delivery order.

use std::io;

use async_trait::async_trait;
use tokio::sync::mpsc;

use cairn_core::peer::PeerMeta;

/// One raw update from the gossip layer.
///
/// `state` is the protocol's numeric state code (0 alive, 1 suspect,
/// 2 dead); unknown codes are dropped by the consumer.
#[derive(Debug, Clone)]
pub struct MembershipEvent {
    pub meta: PeerMeta,
    pub state: u8,
    pub host: String,
}

/// Handle to a running gossip instance.
#[async_trait]
pub trait Gossip: Send + Sync + 'static {
    /// The local node's `(host, meta)` as configured at construction.
    fn local(&self) -> (String, PeerMeta);

    /// Start probing the given `host:port` seeds. May be called again for
    /// periodic re-join.
    async fn join(&self, hosts: Vec<String>) -> io::Result<()>;

    /// Hand over the update stream. Yields `Some` exactly once; the
    /// discovery pump is the stream's only consumer.
    fn take_updates(&self) -> Option<mpsc::UnboundedReceiver<MembershipEvent>>;
}
