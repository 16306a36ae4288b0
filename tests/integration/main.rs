//! Cairn integration test harness.
//!
//! End-to-end flow against scripted collaborators: a gossip double whose
//! update stream each test feeds by hand, and a connector whose outcome
//! is scripted per channel. No real network anywhere; DNS is only
//! touched by the one bootstrap test that resolves `localhost`.

mod bootstrap;
mod resolution;

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use cairn_core::peer::{PeerMeta, RouterId};
use cairn_services::{Connector, Discovery, Gossip, MembershipEvent, RawSend};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Gossip double. Updates come from a sender the test holds; join calls
/// are recorded for assertion.
pub struct TestGossip {
    host: String,
    meta: PeerMeta,
    updates: Mutex<Option<mpsc::UnboundedReceiver<MembershipEvent>>>,
    pub joins: Mutex<Vec<Vec<String>>>,
}

impl TestGossip {
    pub fn new(host: &str, meta: PeerMeta) -> (Arc<Self>, mpsc::UnboundedSender<MembershipEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gossip = Arc::new(Self {
            host: host.to_string(),
            meta,
            updates: Mutex::new(Some(rx)),
            joins: Mutex::new(Vec::new()),
        });
        (gossip, tx)
    }
}

#[async_trait]
impl Gossip for TestGossip {
    fn local(&self) -> (String, PeerMeta) {
        (self.host.clone(), self.meta.clone())
    }

    async fn join(&self, hosts: Vec<String>) -> io::Result<()> {
        self.joins.lock().unwrap().push(hosts);
        Ok(())
    }

    fn take_updates(&self) -> Option<mpsc::UnboundedReceiver<MembershipEvent>> {
        self.updates.lock().unwrap().take()
    }
}

/// Per-channel dial outcome.
#[derive(Clone, Copy)]
pub enum Dial {
    Accept,
    Refuse,
    Fail,
}

/// Connector double. Unscripted channels accept; accepted dials get a
/// sink the test can inspect.
#[derive(Default)]
pub struct TestConnector {
    scripts: Mutex<HashMap<String, Dial>>,
    pub dialed: Mutex<Vec<String>>,
    pub sent: Arc<Mutex<Vec<(String, Bytes)>>>,
}

impl TestConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, channel: &str, outcome: Dial) {
        self.scripts
            .lock()
            .unwrap()
            .insert(channel.to_string(), outcome);
    }
}

#[async_trait]
impl Connector for TestConnector {
    async fn connect(&self, channel: &str) -> io::Result<RawSend> {
        self.dialed.lock().unwrap().push(channel.to_string());
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .get(channel)
            .copied()
            .unwrap_or(Dial::Accept);
        match outcome {
            Dial::Refuse => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
            Dial::Fail => Err(io::Error::new(io::ErrorKind::TimedOut, "timed out")),
            Dial::Accept => {
                let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
                let sink = self.sent.clone();
                let channel = channel.to_string();
                tokio::spawn(async move {
                    while let Some(frame) = rx.recv().await {
                        sink.lock().unwrap().push((channel.clone(), frame));
                    }
                });
                Ok(RawSend::new(tx))
            }
        }
    }
}

/// A bound discovery node with its event feed and gossip handle.
pub fn node(id: &str) -> (Discovery, mpsc::UnboundedSender<MembershipEvent>, Arc<TestGossip>) {
    let meta = PeerMeta::new(id)
        .with_key_hint("c2VsZg==")
        .with_channel(format!("tcp://{id}:3020"));
    let (gossip, tx) = TestGossip::new("10.0.0.1:2700", meta);
    let discovery = Discovery::bind(gossip.clone(), 2700).expect("bind should succeed");
    (discovery, tx, gossip)
}

/// An alive-peer event carrying a dialable channel.
pub fn alive(id: &str, host: &str) -> MembershipEvent {
    MembershipEvent {
        meta: PeerMeta::new(id).with_channel(format!("tcp://{id}:3020")),
        state: 0,
        host: host.to_string(),
    }
}

pub fn rid(id: &str) -> RouterId {
    RouterId::from(id)
}

/// Let spawned pump and flush tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}
