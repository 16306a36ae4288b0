//! Seed-host expansion for bootstrap and re-join.
//!
//! Callers hand the gossip layer either a domain name or an explicit host
//! list; the gossip layer wants concrete `host:port` strings. Expansion is
//! independent of roster state and may run any number of times (initial
//! bootstrap, periodic re-join).

use std::net::Ipv6Addr;

/// Where the seed hosts come from.
///
/// An explicit two-armed type rather than guessing from the value shape:
/// anything else at the call site is a compile error, which is the usage
/// error the wire-shaped original had to detect at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedHosts {
    /// A DNS name expanded into one seed per resolved address.
    Domain(String),
    /// Explicit host list; entries without a port get the default appended.
    List(Vec<String>),
}

impl From<&str> for SeedHosts {
    fn from(name: &str) -> Self {
        SeedHosts::Domain(name.to_string())
    }
}

impl From<String> for SeedHosts {
    fn from(name: String) -> Self {
        SeedHosts::Domain(name)
    }
}

impl From<Vec<String>> for SeedHosts {
    fn from(hosts: Vec<String>) -> Self {
        SeedHosts::List(hosts)
    }
}

impl From<&[&str]> for SeedHosts {
    fn from(hosts: &[&str]) -> Self {
        SeedHosts::List(hosts.iter().map(|h| h.to_string()).collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("dns lookup for {name} failed: {source}")]
    Dns {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("dns lookup for {0} returned no addresses")]
    EmptyAnswer(String),
}

/// Expand a seed specification into concrete `host:port` strings.
///
/// Only the `Domain` arm suspends (DNS); the host list arm is pure.
pub async fn expand(seeds: SeedHosts, default_port: u16) -> Result<Vec<String>, SeedError> {
    match seeds {
        SeedHosts::Domain(name) => {
            let addrs = tokio::net::lookup_host((name.as_str(), default_port))
                .await
                .map_err(|source| SeedError::Dns {
                    name: name.clone(),
                    source,
                })?;
            let hosts: Vec<String> = addrs.map(|addr| addr.to_string()).collect();
            if hosts.is_empty() {
                return Err(SeedError::EmptyAnswer(name));
            }
            Ok(hosts)
        }
        SeedHosts::List(hosts) => Ok(hosts
            .into_iter()
            .map(|host| with_default_port(host, default_port))
            .collect()),
    }
}

/// Append `:port` to entries that don't already carry one.
///
/// A bare IPv6 address contains colons but no port; it gets bracketed.
fn with_default_port(host: String, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        return format!("[{host}]:{port}");
    }
    if host.contains(':') {
        host
    } else {
        format!("{host}:{port}")
    }
}
