//! Topology construction.
//!
//! Turns a declarative [`TopologyConfig`] into a [`Topology`]: switches
//! ordered top-down, hosts with formula-derived addresses, and the trunk
//! and edge links joining them.

use super::types::{Controller, Host, Link, Switch, Tier, Topology};
use crate::config::{TopologyConfig, ValidationError};
use crate::ip::{host_address, AddressRegistry, HostAddress, Subnet};
use crate::utils::validation::{validate_tier_invariants, validate_tree};

/// Build a topology from its description
///
/// The configuration is validated first, so a host count past the address
/// formula's capacity fails here rather than producing duplicate addresses.
/// Building the same configuration twice yields equal topologies.
pub fn build_topology(config: &TopologyConfig) -> Result<Topology, ValidationError> {
    config.validate()?;

    let controller = Controller {
        name: config.controller.name.clone(),
        address: config.controller.address,
        probe: config.controller.probe,
        probe_timeout: config.controller.probe_timeout,
    };

    // Stable sort keeps declaration order inside each tier
    let mut switch_configs: Vec<_> = config.switches.iter().collect();
    switch_configs.sort_by_key(|s| s.tier);

    let switches: Vec<Switch> = switch_configs
        .iter()
        .map(|s| Switch { name: s.name.clone(), tier: s.tier })
        .collect();

    let hosts = assign_hosts(config)?;

    let mut links = Vec::with_capacity(switches.len() - 1 + hosts.len());
    for switch in &switch_configs {
        if let Some(uplink) = &switch.uplink {
            links.push(Link::trunk(&uplink.to, &switch.name, uplink.shaping()));
        }
    }

    let access: Vec<&Switch> = switches.iter().filter(|s| s.tier == Tier::Access).collect();
    for host in &hosts {
        let switch = access[(host.index - 1) / config.hosts.per_access_switch];
        links.push(Link::edge(&host.name, &switch.name));
    }

    let topology = Topology { controller, switches, hosts, links };

    validate_tier_invariants(&topology).map_err(ValidationError::InvalidTopology)?;
    validate_tree(&topology).map_err(ValidationError::InvalidTopology)?;

    log::debug!(
        "Built topology: {} switches, {} hosts, {} links",
        topology.switches.len(),
        topology.hosts.len(),
        topology.links.len()
    );
    Ok(topology)
}

fn assign_hosts(config: &TopologyConfig) -> Result<Vec<Host>, ValidationError> {
    let addresses = assign_addresses(config.hosts.count, &config.subnets, config.hosts.per_subnet)?;

    let mut registry = AddressRegistry::new();
    let mut hosts = Vec::with_capacity(addresses.len());
    for (i, address) in addresses.into_iter().enumerate() {
        let index = i + 1;
        let name = config.hosts.name(index);
        if let Err(first) = registry.register(&address, &name) {
            return Err(ValidationError::DuplicateAddress {
                address: address.to_string(),
                first,
                second: name,
            });
        }
        hosts.push(Host { name, index, address });
    }
    Ok(hosts)
}

/// Addresses for hosts `1..=count`, without any uniqueness check
pub fn assign_addresses(
    count: usize,
    subnets: &[Subnet],
    hosts_per_subnet: usize,
) -> Result<Vec<HostAddress>, ValidationError> {
    (1..=count)
        .map(|index| host_address(index, subnets, hosts_per_subnet).map_err(ValidationError::from))
        .collect()
}
