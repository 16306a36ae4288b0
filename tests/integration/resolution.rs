use crate::*;

use std::io;

use bytes::Bytes;

use cairn_core::peer::{PeerMeta, PeerStatus};
use cairn_services::{MembershipEvent, ResolverChain};

#[tokio::test]
async fn discovered_peer_resolves_to_a_live_send() {
    let (discovery, tx, _gossip) = node("me");
    let connector = TestConnector::new();
    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, connector.clone());

    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;

    let send = chain
        .resolve(&rid("A"))
        .await
        .unwrap()
        .expect("discovered peer must resolve");
    send.send(Bytes::from_static(b"hello")).unwrap();
    settle().await;

    let sent = connector.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "tcp://A:3020");
    assert_eq!(&sent[0].1[..], b"hello");
}

#[tokio::test]
async fn unknown_id_walks_off_the_end_of_the_chain() {
    let (discovery, _tx, _gossip) = node("me");
    let connector = TestConnector::new();
    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, connector.clone());

    let out = chain.resolve(&rid("ghost")).await.unwrap();
    assert!(out.is_none());
    assert!(connector.dialed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refused_peer_is_evicted_then_rediscovered_by_gossip() {
    let (discovery, tx, _gossip) = node("me");
    let connector = TestConnector::new();
    connector.script("tcp://A:3020", Dial::Refuse);
    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, connector.clone());

    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;

    // refused: declined, evicted
    let out = chain.resolve(&rid("A")).await.unwrap();
    assert!(out.is_none());
    assert!(discovery.roster().get(&rid("A")).is_none());

    // the peer comes back through gossip, as it would in production
    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;
    let record = discovery.roster().get(&rid("A")).expect("rediscovered");
    assert_eq!(record.status, PeerStatus::Alive);
}

#[tokio::test]
async fn unexpected_dial_failure_evicts_and_propagates() {
    let (discovery, tx, _gossip) = node("me");
    let connector = TestConnector::new();
    connector.script("tcp://A:3020", Dial::Fail);
    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, connector.clone());

    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;

    let err = chain.resolve(&rid("A")).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    assert!(discovery.roster().get(&rid("A")).is_none());
}

#[tokio::test]
async fn resolver_rereads_channel_updated_by_gossip() {
    let (discovery, tx, _gossip) = node("me");
    let connector = TestConnector::new();
    let chain = ResolverChain::new();
    discovery.register_route_discovery(&chain, connector.clone());

    tx.send(alive("A", "h1:1")).unwrap();
    settle().await;
    // peer restarts on a new channel; same (absent-equal) key hint admits
    tx.send(MembershipEvent {
        meta: PeerMeta::new("A").with_channel("tcp://A:4020"),
        state: 0,
        host: "h1:2".to_string(),
    })
    .unwrap();
    settle().await;

    chain.resolve(&rid("A")).await.unwrap().expect("resolves");
    assert_eq!(connector.dialed.lock().unwrap().as_slice(), ["tcp://A:4020"]);
}
