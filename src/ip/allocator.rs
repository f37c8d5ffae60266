//! Deterministic host address assignment.
//!
//! Host addresses are a pure function of the host's 1-based index, the list
//! of declared subnets and the number of hosts each subnet takes. Nothing
//! here touches a network or a registry, so the formula can be checked on
//! its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Errors produced while parsing subnets or deriving host addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid subnet '{0}': expected <ipv4>/<prefix>")]
    InvalidSubnet(String),
    #[error("Invalid prefix length {0}: must be between 0 and 32")]
    InvalidPrefix(u8),
    #[error("Host indexes are 1-based, got 0")]
    ZeroIndex,
    #[error("No subnets declared")]
    NoSubnets,
    #[error("hosts_per_subnet must be at least 1")]
    ZeroHostsPerSubnet,
    #[error("Subnet {subnet} cannot hold {hosts} hosts")]
    SubnetTooSmall { subnet: Subnet, hosts: usize },
}

/// An IPv4 subnet such as `10.0.0.0/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, AddressError> {
        if prefix_len > 32 {
            return Err(AddressError::InvalidPrefix(prefix_len));
        }
        Ok(Self::from_octets(network.octets(), prefix_len))
    }

    /// Build a subnet from literal octets. Prefixes above 32 are clamped.
    pub fn from_octets(octets: [u8; 4], prefix_len: u8) -> Self {
        let prefix_len = prefix_len.min(32);
        // Keep only the network bits so "10.0.0.7/24" and "10.0.0.0/24" compare equal
        let network = Ipv4Addr::from(u32::from(Ipv4Addr::from(octets)) & Self::mask(prefix_len));
        Self { network, prefix_len }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of usable host addresses (network and broadcast excluded)
    pub fn usable_hosts(&self) -> u64 {
        let size = 1u64 << (32 - u32::from(self.prefix_len));
        size.saturating_sub(2)
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    /// The address `offset` positions after the network address
    fn nth(&self, offset: u32) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network).wrapping_add(offset))
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Subnet {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| AddressError::InvalidSubnet(s.to_string()))?;
        let network = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| AddressError::InvalidSubnet(s.to_string()))?;
        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|_| AddressError::InvalidSubnet(s.to_string()))?;
        Subnet::new(network, prefix_len)
    }
}

impl TryFrom<String> for Subnet {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}

/// A host interface address with its prefix length, e.g. `10.0.0.1/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAddress {
    pub ip: Ipv4Addr,
    pub prefix_len: u8,
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}

impl TryFrom<String> for HostAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (addr, prefix) = value
            .split_once('/')
            .ok_or_else(|| AddressError::InvalidSubnet(value.clone()))?;
        let ip = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| AddressError::InvalidSubnet(value.clone()))?;
        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|_| AddressError::InvalidSubnet(value.clone()))?;
        if prefix_len > 32 {
            return Err(AddressError::InvalidPrefix(prefix_len));
        }
        Ok(HostAddress { ip, prefix_len })
    }
}

impl From<HostAddress> for String {
    fn from(address: HostAddress) -> Self {
        address.to_string()
    }
}

/// Number of hosts the formula can address without a collision.
///
/// Saturates at `usize::MAX` instead of overflowing.
pub fn address_capacity(subnets: &[Subnet], hosts_per_subnet: usize) -> usize {
    subnets.len().saturating_mul(hosts_per_subnet)
}

/// Derive the address of host `index` (1-based).
///
/// The subnet is `subnets[(index - 1) / hosts_per_subnet]`, saturating at the
/// last subnet, and the host part is `((index - 1) % hosts_per_subnet) + 1`.
/// With two /24 subnets and four hosts each this gives hosts 1-4 `.1`-`.4` in
/// the first subnet and hosts 5-8 `.1`-`.4` in the second.
///
/// Indexes past [`address_capacity`] stay in the last subnet and therefore
/// repeat an earlier address. Callers that need uniqueness must bound the
/// host count first.
pub fn host_address(
    index: usize,
    subnets: &[Subnet],
    hosts_per_subnet: usize,
) -> Result<HostAddress, AddressError> {
    if index == 0 {
        return Err(AddressError::ZeroIndex);
    }
    if hosts_per_subnet == 0 {
        return Err(AddressError::ZeroHostsPerSubnet);
    }
    let last = subnets.len().checked_sub(1).ok_or(AddressError::NoSubnets)?;

    let subnet = subnets[((index - 1) / hosts_per_subnet).min(last)];
    if hosts_per_subnet as u64 > subnet.usable_hosts() {
        return Err(AddressError::SubnetTooSmall { subnet, hosts: hosts_per_subnet });
    }

    let host_part = ((index - 1) % hosts_per_subnet) + 1;
    Ok(HostAddress {
        ip: subnet.nth(host_part as u32),
        prefix_len: subnet.prefix_len(),
    })
}
