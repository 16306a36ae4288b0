//! Discovery façade — one roster + notifier bound to a gossip instance.
//!
//! The hub constructs this once per node: derive the local node's
//! description (host, stamped metadata, incarnation), hand it to whatever
//! gossip implementation the process runs, then bind. After that the
//! subsystem is passive — gossip events pump the roster, subscribers get
//! batches, and the resolver answers the hub's discovery chain on demand.

use std::sync::Arc;

use cairn_core::config::CairnConfig;
use cairn_core::peer::{incarnation, KeyHint, MetaMap, PeerMeta, PeerRecord, PeerStatus, RouterId};

use crate::gossip::Gossip;
use crate::notifier::ChangeNotifier;
use crate::resolver::{Connector, ResolverChain, RosterResolver};
use crate::roster::Roster;
use crate::seeds::{self, SeedError, SeedHosts};

/// The hub-assigned identity of the local node.
#[derive(Debug, Clone)]
pub struct HubIdentity {
    pub id_router: RouterId,
    pub ec_pub_id: Option<KeyHint>,
}

/// Connection info for the local routing channel.
#[derive(Debug, Clone)]
pub struct ConnAddr {
    /// Address URL remote hubs can dial, e.g. `tcp://10.0.0.5:3020`.
    pub url: String,
    /// Bare address, used to derive the gossip host when none is given.
    pub address: String,
}

/// Source of the local channel's connection info.
pub trait ConnInfo: Send + Sync {
    fn conn_info(&self) -> ConnAddr;
}

/// Where the advertised channel comes from — a known address, or a
/// provider (e.g. a bound server) queried at construction.
pub enum ChannelSource {
    Address(String),
    Provider(Arc<dyn ConnInfo>),
}

/// Construction options for [`Discovery::create`].
#[derive(Default)]
pub struct DiscoveryOptions {
    /// Gossip `host:port`. Derived from the channel provider when absent.
    pub host: Option<String>,
    /// Application metadata to disseminate (topics and the like).
    pub meta: MetaMap,
    pub channel: Option<ChannelSource>,
    /// Overrides the configured gossip port.
    pub swim_port: Option<u16>,
    /// Overrides the time-based default incarnation.
    pub incarnation: Option<u64>,
}

/// Everything the gossip layer needs to know about the local node.
#[derive(Debug, Clone)]
pub struct LocalNode {
    pub host: String,
    pub meta: PeerMeta,
    pub incarnation: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("discovery requires a host: none given and no channel info to derive one from")]
    MissingHost,
    #[error("gossip update stream already taken")]
    UpdateStreamTaken,
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error("gossip join failed: {0}")]
    Join(#[source] std::io::Error),
}

/// The membership-discovery subsystem, bound to one gossip instance.
pub struct Discovery {
    roster: Roster,
    notifier: ChangeNotifier,
    gossip: Arc<dyn Gossip>,
    swim_port: u16,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("swim_port", &self.swim_port)
            .finish_non_exhaustive()
    }
}

impl Discovery {
    /// Derive the local node description from hub identity and options.
    ///
    /// The identity fields always win: `id_router` and `ec_pub_id` are
    /// stamped from the hub, never from caller metadata.
    pub fn local_node(
        identity: &HubIdentity,
        opts: DiscoveryOptions,
        config: &CairnConfig,
    ) -> Result<LocalNode, DiscoveryError> {
        let swim_port = opts.swim_port.unwrap_or(config.swim_port);

        let mut host = opts.host;
        let channel = match opts.channel {
            Some(ChannelSource::Address(url)) => Some(url),
            Some(ChannelSource::Provider(provider)) => {
                let conn = provider.conn_info();
                if host.is_none() {
                    host = Some(format!("{}:{}", conn.address, swim_port));
                }
                Some(conn.url)
            }
            None => None,
        };
        let host = host.ok_or(DiscoveryError::MissingHost)?;

        let meta = PeerMeta {
            id_router: identity.id_router.clone(),
            ec_pub_id: identity.ec_pub_id.clone(),
            channel,
            extra: opts.meta,
        };
        Ok(LocalNode {
            host,
            meta,
            incarnation: opts.incarnation.unwrap_or_else(incarnation),
        })
    }

    /// Bind to a running gossip instance: seed the self record and start
    /// the pump applying updates in delivery order.
    pub fn bind(gossip: Arc<dyn Gossip>, swim_port: u16) -> Result<Self, DiscoveryError> {
        let notifier = ChangeNotifier::new();
        let roster = Roster::new(notifier.clone());

        let (host, meta) = gossip.local();
        roster.seed_self(meta, &host);

        let mut updates = gossip
            .take_updates()
            .ok_or(DiscoveryError::UpdateStreamTaken)?;
        let pump = roster.clone();
        tokio::spawn(async move {
            while let Some(event) = updates.recv().await {
                let Some(status) = PeerStatus::from_state_code(event.state) else {
                    tracing::debug!(state = event.state, "unknown gossip state code; dropped");
                    continue;
                };
                pump.apply_update(event.meta, status, &event.host);
            }
            tracing::debug!("gossip update stream closed");
        });

        Ok(Self {
            roster,
            notifier,
            gossip,
            swim_port,
        })
    }

    /// Factory: derive the local node, construct a gossip instance for it,
    /// and bind. `make_gossip` receives the node description and the
    /// opaque protocol tuning.
    pub fn create<F>(
        identity: &HubIdentity,
        opts: DiscoveryOptions,
        config: &CairnConfig,
        make_gossip: F,
    ) -> Result<Self, DiscoveryError>
    where
        F: FnOnce(LocalNode, cairn_core::config::SwimTuning) -> Arc<dyn Gossip>,
    {
        let swim_port = opts.swim_port.unwrap_or(config.swim_port);
        let local = Self::local_node(identity, opts, config)?;
        let gossip = make_gossip(local, config.swim.clone());
        Self::bind(gossip, swim_port)
    }

    /// The current membership view.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The local node's gossip `host:port`.
    pub fn localhost(&self) -> String {
        self.gossip.local().0
    }

    /// Register a batch-notification callback.
    pub fn subscribe(&self, callback: impl Fn(&[PeerRecord]) + Send + Sync + 'static) {
        self.notifier.subscribe(callback);
    }

    /// Expand the seeds and hand them to the gossip layer's join.
    ///
    /// Independent of roster state; callable repeatedly for re-join.
    pub async fn bootstrap(&self, seeds: impl Into<SeedHosts>) -> Result<(), DiscoveryError> {
        let hosts = seeds::expand(seeds.into(), self.swim_port).await?;
        tracing::info!(seeds = hosts.len(), "joining gossip mesh");
        self.gossip.join(hosts).await.map_err(DiscoveryError::Join)
    }

    /// Offer the roster to the hub's discovery chain.
    pub fn register_route_discovery(&self, chain: &ResolverChain, connector: Arc<dyn Connector>) {
        chain.push(Arc::new(RosterResolver::new(
            self.roster.clone(),
            connector,
        )));
    }
}
