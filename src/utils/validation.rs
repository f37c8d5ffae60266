//! Topology validation utilities.
//!
//! Structural checks run on a built [`Topology`] before it is handed to an
//! emulator.

use crate::topology::graph::LinkGraph;
use crate::topology::types::{LinkKind, Tier, Topology};
use std::collections::HashSet;

/// Validate the tier wiring rules
///
/// Checks that:
/// - every host has exactly one link, and it goes to an access switch
/// - every aggregation or access switch has exactly one uplink, to the tier above
/// - trunk links only join switches, edge links only join a host and a switch
/// - no link is declared twice
///
/// # Arguments
/// * `topology` - The built topology to check
///
/// # Returns
/// * `Ok(())` if all rules hold
/// * `Err(String)` naming the first violation
///
/// # Examples
/// ```
/// use tiernet::config::TopologyConfig;
/// use tiernet::topology::build_topology;
/// use tiernet::utils::validation::validate_tier_invariants;
///
/// let topology = build_topology(&TopologyConfig::default()).unwrap();
/// assert!(validate_tier_invariants(&topology).is_ok());
/// ```
pub fn validate_tier_invariants(topology: &Topology) -> Result<(), String> {
    let mut keys = HashSet::new();
    for link in &topology.links {
        if link.a == link.b {
            return Err(format!("link {} loops back onto itself", link));
        }
        if !keys.insert(link.key()) {
            return Err(format!("link {} is declared more than once", link));
        }
        for end in [&link.a, &link.b] {
            if !topology.contains_node(end) {
                return Err(format!("link {} references unknown node '{}'", link, end));
            }
        }
        let hosts = [&link.a, &link.b].iter().filter(|n| topology.host(n).is_some()).count();
        match (link.kind, hosts) {
            (LinkKind::Trunk, 0) | (LinkKind::Edge, 1) => {}
            (LinkKind::Trunk, _) => return Err(format!("trunk link {} touches a host", link)),
            (LinkKind::Edge, _) => {
                return Err(format!("edge link {} must join one host and one switch", link))
            }
        }
    }

    for host in &topology.hosts {
        let links: Vec<_> = topology.links_of(&host.name).collect();
        if links.len() != 1 {
            return Err(format!("host '{}' has {} links, expected 1", host.name, links.len()));
        }
        let peer = links[0].other(&host.name).unwrap_or_default();
        match topology.switch(peer) {
            Some(switch) if switch.tier == Tier::Access => {}
            _ => {
                return Err(format!(
                    "host '{}' must attach to an access switch, not '{}'",
                    host.name, peer
                ))
            }
        }
    }

    for switch in &topology.switches {
        let Some(parent_tier) = switch.tier.parent() else {
            continue;
        };
        let uplinks: Vec<&str> = topology
            .links_of(&switch.name)
            .filter_map(|l| l.other(&switch.name))
            .filter(|peer| topology.switch(peer).map(|s| s.tier) == Some(parent_tier))
            .collect();
        if uplinks.len() != 1 {
            return Err(format!(
                "{} switch '{}' has {} uplinks to the {} tier, expected 1",
                switch.tier,
                switch.name,
                uplinks.len(),
                parent_tier
            ));
        }
    }

    Ok(())
}

/// Validate that the link graph is a tree
///
/// A tree is connected and has exactly `nodes - 1` links, which makes the
/// path between any two nodes unique.
pub fn validate_tree(topology: &Topology) -> Result<(), String> {
    let graph = LinkGraph::from(topology);
    if !graph.is_connected() {
        return Err("link graph is not connected".to_string());
    }
    if graph.link_count() + 1 != graph.node_count() {
        return Err(format!(
            "link graph has {} nodes and {} links; a tree needs {} links",
            graph.node_count(),
            graph.link_count(),
            graph.node_count().saturating_sub(1)
        ));
    }
    log::debug!(
        "Tree check passed: {} nodes, {} links",
        graph.node_count(),
        graph.link_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyConfig;
    use crate::topology::build_topology;
    use crate::topology::types::{Link, LinkShaping};

    fn default_topology() -> Topology {
        build_topology(&TopologyConfig::default()).unwrap()
    }

    #[test]
    fn test_default_topology_passes() {
        let topology = default_topology();
        assert!(validate_tier_invariants(&topology).is_ok());
        assert!(validate_tree(&topology).is_ok());
    }

    #[test]
    fn test_redundant_link_breaks_tree() {
        let mut topology = default_topology();
        topology.links.push(Link::trunk("s2", "s3", LinkShaping::default()));
        assert!(validate_tree(&topology).is_err());
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let mut topology = default_topology();
        topology.links.push(Link::edge("s4", "h1"));
        let err = validate_tier_invariants(&topology).unwrap_err();
        assert!(err.contains("more than once"), "{}", err);
    }

    #[test]
    fn test_host_on_aggregation_switch_rejected() {
        let mut topology = default_topology();
        let edge = topology.links.iter_mut().find(|l| l.a == "h1").unwrap();
        edge.b = "s2".to_string();
        let err = validate_tier_invariants(&topology).unwrap_err();
        assert!(err.contains("access switch"), "{}", err);
    }

    #[test]
    fn test_missing_uplink_rejected() {
        let mut topology = default_topology();
        topology.links.retain(|l| l.key() != ("s2", "s4"));
        assert!(validate_tier_invariants(&topology).is_err());
        assert!(validate_tree(&topology).is_err());
    }

    #[test]
    fn test_trunk_touching_host_rejected() {
        let mut topology = default_topology();
        let edge = topology.links.iter_mut().find(|l| l.a == "h8").unwrap();
        edge.kind = LinkKind::Trunk;
        assert!(validate_tier_invariants(&topology).is_err());
    }
}
