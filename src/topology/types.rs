//! Topology type definitions.
//!
//! The built, immutable description of an emulated network: one controller,
//! switches grouped by tier, addressed hosts and shaped links.

use crate::ip::HostAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Switch tier in a core/aggregation/access hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Aggregation,
    Access,
}

impl Tier {
    /// Tier a switch of this tier must uplink to, `None` for the core
    pub fn parent(&self) -> Option<Tier> {
        match self {
            Tier::Core => None,
            Tier::Aggregation => Some(Tier::Core),
            Tier::Access => Some(Tier::Aggregation),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Core => "core",
            Tier::Aggregation => "aggregation",
            Tier::Access => "access",
        };
        f.write_str(name)
    }
}

/// The remote flow controller every switch connects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub name: String,
    pub address: SocketAddr,
    /// Probe the control channel with a TCP connect before starting
    pub probe: bool,
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub name: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    /// 1-based position used by the address formula
    pub index: usize,
    pub address: HostAddress,
}

/// Whether a link joins two switches or a host to its switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Trunk,
    Edge,
}

/// Optional traffic shaping applied by the emulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkShaping {
    /// Bandwidth in Mbit/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u32>,
    /// One-way delay
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

impl LinkShaping {
    pub fn new(bandwidth: u32, delay: Duration) -> Self {
        Self { bandwidth: Some(bandwidth), delay: Some(delay) }
    }

    pub fn is_shaped(&self) -> bool {
        self.bandwidth.is_some() || self.delay.is_some()
    }
}

/// An undirected link between two named nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub a: String,
    pub b: String,
    pub kind: LinkKind,
    #[serde(default)]
    pub shaping: LinkShaping,
}

impl Link {
    pub fn trunk(a: &str, b: &str, shaping: LinkShaping) -> Self {
        Self { a: a.to_string(), b: b.to_string(), kind: LinkKind::Trunk, shaping }
    }

    pub fn edge(host: &str, switch: &str) -> Self {
        Self {
            a: host.to_string(),
            b: switch.to_string(),
            kind: LinkKind::Edge,
            shaping: LinkShaping::default(),
        }
    }

    /// Endpoints in a canonical order, so `a-b` and `b-a` share a key
    pub fn key(&self) -> (&str, &str) {
        if self.a <= self.b {
            (self.a.as_str(), self.b.as_str())
        } else {
            (self.b.as_str(), self.a.as_str())
        }
    }

    pub fn touches(&self, node: &str) -> bool {
        self.a == node || self.b == node
    }

    /// The endpoint opposite `node`, if `node` is on this link
    pub fn other(&self, node: &str) -> Option<&str> {
        if self.a == node {
            Some(self.b.as_str())
        } else if self.b == node {
            Some(self.a.as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.a, self.b)?;
        if let Some(bw) = self.shaping.bandwidth {
            write!(f, " {}Mbit", bw)?;
        }
        if let Some(delay) = self.shaping.delay {
            write!(f, " {}", crate::utils::duration::format_delay(delay))?;
        }
        Ok(())
    }
}

/// A fully built topology, ready to be declared to an emulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub controller: Controller,
    /// Switches ordered core first, then aggregation, then access
    pub switches: Vec<Switch>,
    /// Hosts in index order
    pub hosts: Vec<Host>,
    /// Trunk links first, then edge links
    pub links: Vec<Link>,
}

impl Topology {
    pub fn node_count(&self) -> usize {
        self.switches.len() + self.hosts.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn switch(&self, name: &str) -> Option<&Switch> {
        self.switches.iter().find(|s| s.name == name)
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn switches_in(&self, tier: Tier) -> impl Iterator<Item = &Switch> {
        self.switches.iter().filter(move |s| s.tier == tier)
    }

    pub fn links_of<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| l.touches(node))
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.switch(name).is_some() || self.host(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_key_is_unordered() {
        let ab = Link::trunk("s1", "s2", LinkShaping::default());
        let ba = Link::trunk("s2", "s1", LinkShaping::default());
        assert_eq!(ab.key(), ba.key());
        assert_eq!(ab.other("s1"), Some("s2"));
        assert_eq!(ab.other("s3"), None);
    }

    #[test]
    fn test_link_display() {
        let trunk = Link::trunk("s1", "s2", LinkShaping::new(50, Duration::from_millis(2)));
        assert_eq!(trunk.to_string(), "s1<->s2 50Mbit 2ms");
        assert_eq!(Link::edge("h1", "s4").to_string(), "h1<->s4");
    }

    #[test]
    fn test_tier_parent() {
        assert_eq!(Tier::Core.parent(), None);
        assert_eq!(Tier::Aggregation.parent(), Some(Tier::Core));
        assert_eq!(Tier::Access.parent(), Some(Tier::Aggregation));
    }

    #[test]
    fn test_shaping_yaml() {
        let shaping: LinkShaping = serde_yaml::from_str("bandwidth: 30\ndelay: 5ms\n").unwrap();
        assert_eq!(shaping, LinkShaping::new(30, Duration::from_millis(5)));
        assert!(!LinkShaping::default().is_shaped());
    }
}
