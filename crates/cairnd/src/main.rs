//! cairnd — single-node Cairn demo daemon.
//!
//! Exercises the full embedding surface — factory, bootstrap,
//! subscription, resolver chain — against loopback stand-ins for the
//! gossip layer and the hub transport. Point `CAIRN_PEERS` at
//! comma-separated seed hosts to watch bootstrap expansion run.

mod loopback;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use rand::seq::SliceRandom;

use cairn_core::config::CairnConfig;
use cairn_core::peer::{PeerStatus, RouterId};
use cairn_services::{
    ChannelSource, Discovery, DiscoveryOptions, HubIdentity, ResolverChain,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = CairnConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = CairnConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        CairnConfig::default()
    });

    let identity = HubIdentity {
        id_router: RouterId::new(format!("cairnd-{}", std::process::id())),
        ec_pub_id: None,
    };
    tracing::info!(id_router = %identity.id_router, swim_port = config.swim_port, "cairnd starting");

    let mut opts = DiscoveryOptions::default();
    opts.meta.insert("topics".to_string(), serde_json::json!(["demo", "common"]));
    opts.channel = Some(ChannelSource::Provider(Arc::new(
        loopback::LoopbackChannel::new("127.0.0.1", 3020),
    )));

    let discovery = Discovery::create(&identity, opts, &config, |local, tuning| {
        tracing::info!(
            host = %local.host,
            incarnation = local.incarnation,
            interval_ms = tuning.interval_ms,
            "gossip stub bound"
        );
        loopback::LoopbackGossip::shared(local)
    })?;

    discovery.subscribe(|batch| {
        for record in batch {
            tracing::info!(
                id_router = %record.id_router,
                status = %record.status,
                host = %record.host,
                "membership update"
            );
        }
    });

    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, Arc::new(loopback::LoopbackConnector));

    // Seed hosts from the environment, e.g. CAIRN_PEERS=10.0.0.2,10.0.0.3:9000
    let peers: Vec<String> = std::env::var("CAIRN_PEERS")
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    discovery.bootstrap(peers).await?;

    // Ping a random live peer every second, pruning dead entries first.
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;

        let roster = discovery.roster();
        for record in roster.snapshot() {
            if record.status == PeerStatus::Dead {
                roster.remove(&record.id_router);
            }
        }

        let candidates: Vec<_> = roster
            .snapshot()
            .into_iter()
            .filter(|r| r.status != PeerStatus::SelfEntry)
            .collect();
        let Some(target) = candidates.choose(&mut rand::thread_rng()) else {
            tracing::debug!("no peers discovered yet");
            continue;
        };

        match chain.resolve(&target.id_router).await {
            Ok(Some(send)) => {
                let _ = send.send(Bytes::from_static(b"hello from cairnd"));
            }
            Ok(None) => {
                tracing::debug!(id_router = %target.id_router, "peer declined resolution");
            }
            Err(e) => {
                tracing::warn!(id_router = %target.id_router, error = %e, "peer resolution failed");
            }
        }
    }
}
