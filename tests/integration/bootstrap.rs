use crate::*;

use std::sync::{Arc, Mutex};

use cairn_core::config::CairnConfig;
use cairn_core::peer::{KeyHint, PeerStatus, RouterId};
use cairn_services::{
    ChannelSource, Discovery, DiscoveryOptions, Gossip, HubIdentity, SeedHosts,
};

#[tokio::test]
async fn seed_list_expands_with_default_port() {
    let (discovery, _tx, gossip) = node("me");

    discovery
        .bootstrap(vec!["10.0.0.1".to_string(), "10.0.0.2:9000".to_string()])
        .await
        .unwrap();

    let joins = gossip.joins.lock().unwrap();
    assert_eq!(joins.as_slice(), [vec!["10.0.0.1:2700".to_string(), "10.0.0.2:9000".to_string()]]);
}

#[tokio::test]
async fn domain_seed_resolves_and_suffixes_port() {
    let (discovery, _tx, gossip) = node("me");

    discovery
        .bootstrap(SeedHosts::Domain("localhost".to_string()))
        .await
        .unwrap();

    let joins = gossip.joins.lock().unwrap();
    assert_eq!(joins.len(), 1);
    assert!(!joins[0].is_empty());
    assert!(joins[0].iter().all(|h| h.ends_with(":2700")));
}

#[tokio::test]
async fn rejoin_is_independent_of_roster_state() {
    let (discovery, tx, gossip) = node("me");
    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;

    discovery.bootstrap(vec!["10.0.0.1".to_string()]).await.unwrap();
    discovery.bootstrap(vec!["10.0.0.1".to_string()]).await.unwrap();

    assert_eq!(gossip.joins.lock().unwrap().len(), 2);
    assert!(discovery.roster().get(&rid("A")).is_some());
}

#[tokio::test]
async fn factory_stamps_identity_and_seeds_self() {
    let identity = HubIdentity {
        id_router: RouterId::from("hub-7"),
        ec_pub_id: Some(KeyHint::from("aHViLTc=")),
    };
    let mut opts = DiscoveryOptions::default();
    opts.host = Some("10.0.0.9:2700".to_string());
    opts.channel = Some(ChannelSource::Address("tcp://10.0.0.9:3020".to_string()));
    opts.meta.insert("topics".to_string(), serde_json::json!(["service_one", "common"]));

    let captured: Arc<Mutex<Option<Arc<TestGossip>>>> = Arc::default();
    let slot = captured.clone();
    let discovery = Discovery::create(&identity, opts, &CairnConfig::default(), |local, tuning| {
        assert_eq!(tuning.interval_ms, 100);
        let (gossip, _tx) = TestGossip::new(&local.host, local.meta);
        *slot.lock().unwrap() = Some(gossip.clone());
        gossip as Arc<dyn Gossip>
    })
    .unwrap();

    let record = discovery.roster().get(&rid("hub-7")).expect("self record");
    assert_eq!(record.status, PeerStatus::SelfEntry);
    assert_eq!(record.host, "10.0.0.9:2700");
    assert_eq!(record.channel.as_deref(), Some("tcp://10.0.0.9:3020"));
    assert_eq!(record.extra["topics"], serde_json::json!(["service_one", "common"]));
    assert_eq!(record.ec_pub_id.as_ref().map(|k| k.as_str()), Some("aHViLTc="));
}
