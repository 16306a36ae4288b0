//! In-process stand-ins for the external collaborators.
//!
//! A real deployment binds Discovery to a SWIM implementation and the
//! hub's transport connector. The demo daemon runs single-node, so both
//! are loopback stubs: gossip that never emits, a connector that accepts
//! every dial and logs what would have gone out on the wire.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use cairn_core::peer::PeerMeta;
use cairn_services::{ConnAddr, ConnInfo, Connector, Gossip, LocalNode, MembershipEvent, RawSend};

/// Fixed connection info for the demo's pretend routing channel.
pub struct LoopbackChannel {
    address: String,
    port: u16,
}

impl LoopbackChannel {
    pub fn new(address: &str, port: u16) -> Self {
        Self {
            address: address.to_string(),
            port,
        }
    }
}

impl ConnInfo for LoopbackChannel {
    fn conn_info(&self) -> ConnAddr {
        ConnAddr {
            url: format!("tcp://{}:{}", self.address, self.port),
            address: self.address.clone(),
        }
    }
}

/// Gossip stub: knows the local node, accepts joins, never emits updates.
pub struct LoopbackGossip {
    host: String,
    meta: PeerMeta,
    updates: Mutex<Option<mpsc::UnboundedReceiver<MembershipEvent>>>,
    // Held so the update stream stays open for the life of the daemon.
    _updates_tx: mpsc::UnboundedSender<MembershipEvent>,
}

impl LoopbackGossip {
    pub fn shared(local: LocalNode) -> Arc<dyn Gossip> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            host: local.host,
            meta: local.meta,
            updates: Mutex::new(Some(rx)),
            _updates_tx: tx,
        })
    }
}

#[async_trait]
impl Gossip for LoopbackGossip {
    fn local(&self) -> (String, PeerMeta) {
        (self.host.clone(), self.meta.clone())
    }

    async fn join(&self, hosts: Vec<String>) -> io::Result<()> {
        tracing::info!(?hosts, "loopback gossip: join is a no-op");
        Ok(())
    }

    fn take_updates(&self) -> Option<mpsc::UnboundedReceiver<MembershipEvent>> {
        self.updates.lock().expect("loopback gossip poisoned").take()
    }
}

/// Connector that accepts every dial and drains frames to the log.
pub struct LoopbackConnector;

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, channel: &str) -> io::Result<RawSend> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let channel = channel.to_string();
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                tracing::info!(%channel, bytes = frame.len(), "loopback send");
            }
        });
        Ok(RawSend::new(tx))
    }
}
