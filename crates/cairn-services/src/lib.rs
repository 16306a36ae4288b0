//! Cairn service layer — the discovery state machine.
//!
//! Three pieces, leaves first:
//! - [`Roster`]: the per-node identity table with the key-hint admission rule.
//! - [`ChangeNotifier`]: debounces roster mutations into batched notifications.
//! - [`RosterResolver`]: resolves a `RouterId` into a live send capability
//!   for the hub's resolver chain.
//!
//! [`Discovery`] ties them to an external gossip instance and is the only
//! type most embedders touch.

pub mod discovery;
pub mod gossip;
pub mod notifier;
pub mod resolver;
pub mod roster;
pub mod seeds;

pub use discovery::{
    ChannelSource, ConnAddr, ConnInfo, Discovery, DiscoveryError, DiscoveryOptions, HubIdentity,
    LocalNode,
};
pub use gossip::{Gossip, MembershipEvent};
pub use notifier::ChangeNotifier;
pub use resolver::{Connector, RawSend, ResolverChain, RosterResolver, RouteResolver};
pub use roster::Roster;
pub use seeds::{SeedError, SeedHosts};
