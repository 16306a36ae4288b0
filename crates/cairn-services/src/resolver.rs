//! Peer resolution — bridges the roster into the hub's discovery chain.
//!
//! The hub resolves a `RouterId` by trying each registered resolver in
//! turn. A resolver answers one of three ways: `Ok(Some(_))` with a send
//! capability, `Ok(None)` to decline ("not mine, try the next one"), or
//! `Err(_)` for a failure the caller must see. The distinction matters:
//! declined keeps the chain going, failed stops it.

use std::io;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use cairn_core::peer::RouterId;

use crate::roster::Roster;

/// Reusable raw-send capability bound to one established connection.
///
/// Cloning shares the underlying connection; sends never block.
#[derive(Debug, Clone)]
pub struct RawSend {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl RawSend {
    pub fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        Self { tx }
    }

    /// Queue one raw frame on the connection.
    pub fn send(&self, frame: Bytes) -> io::Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "connection closed"))
    }
}

/// Outbound connection establishment, owned by the hub's transport layer.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establish or reuse a connection to the given channel descriptor.
    async fn connect(&self, channel: &str) -> io::Result<RawSend>;
}

/// One step of the hub's discovery chain.
#[async_trait]
pub trait RouteResolver: Send + Sync + 'static {
    /// `Ok(None)` declines — the chain tries the next resolver.
    async fn resolve(&self, id_router: &RouterId) -> io::Result<Option<RawSend>>;
}

/// Resolver backed by the discovery roster.
pub struct RosterResolver {
    roster: Roster,
    connector: Arc<dyn Connector>,
}

impl RosterResolver {
    pub fn new(roster: Roster, connector: Arc<dyn Connector>) -> Self {
        Self { roster, connector }
    }
}

#[async_trait]
impl RouteResolver for RosterResolver {
    async fn resolve(&self, id_router: &RouterId) -> io::Result<Option<RawSend>> {
        let Some(entry) = self.roster.get(id_router) else {
            return Ok(None);
        };
        let Some(channel) = entry.channel else {
            // Announced without a channel — nothing to dial, not ours to fail.
            tracing::debug!(%id_router, "roster entry has no channel; declining");
            return Ok(None);
        };

        match self.connector.connect(&channel).await {
            Ok(send) => Ok(Some(send)),
            Err(err) => {
                // The connect ran unlocked; the entry removed here may
                // already be fresher than the one we dialed. Accepted —
                // gossip will re-announce a live peer.
                self.roster.remove(id_router);
                if err.kind() == io::ErrorKind::ConnectionRefused {
                    tracing::debug!(%id_router, %channel, "peer refused connection; evicted");
                    Ok(None)
                } else {
                    tracing::warn!(%id_router, %channel, error = %err, "peer connection failed; evicted");
                    Err(err)
                }
            }
        }
    }
}

/// The hub's ordered list of pluggable resolvers. First answer wins.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Arc<RwLock<Vec<Arc<dyn RouteResolver>>>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver. Later registrations are tried later.
    pub fn push(&self, resolver: Arc<dyn RouteResolver>) {
        self.resolvers
            .write()
            .expect("resolver chain poisoned")
            .push(resolver);
    }

    pub fn len(&self) -> usize {
        self.resolvers.read().expect("resolver chain poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try each resolver in registration order.
    ///
    /// A decline moves on; a send capability or an error ends the walk.
    pub async fn resolve(&self, id_router: &RouterId) -> io::Result<Option<RawSend>> {
        let resolvers: Vec<_> = self
            .resolvers
            .read()
            .expect("resolver chain poisoned")
            .clone();
        for resolver in resolvers {
            if let Some(send) = resolver.resolve(id_router).await? {
                return Ok(Some(send));
            }
        }
        Ok(None)
    }
}
