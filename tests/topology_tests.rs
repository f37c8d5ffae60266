use std::collections::BTreeSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use tiernet::config::TopologyConfig;
use tiernet::emulator::{Emulator, Network, SimEmulator};
use tiernet::ip::{host_address, AddressRegistry};
use tiernet::orchestrator;
use tiernet::shell::Detached;
use tiernet::topology::{build_topology, LinkGraph, LinkKind, Tier, Topology};

fn default_topology() -> Topology {
    let mut config = TopologyConfig::default();
    config.controller.probe = false;
    build_topology(&config).unwrap()
}

/// Every host gets the address the formula predicts
#[test]
fn test_addresses_follow_formula() {
    let topology = default_topology();
    assert_eq!(topology.hosts.len(), 8);
    for host in &topology.hosts {
        let i = host.index;
        assert_eq!(host.name, format!("h{}", i));
        let expected = format!("10.0.{}.{}/24", if i <= 4 { 0 } else { 1 }, ((i - 1) % 4) + 1);
        assert_eq!(host.address.to_string(), expected);
    }
}

/// 15 nodes, 14 links, and the link graph is a tree
#[test]
fn test_tree_counts() {
    let topology = default_topology();
    let graph = LinkGraph::from(&topology);

    assert_eq!(graph.node_count(), 15);
    assert_eq!(graph.link_count(), 14);
    assert_eq!(graph.link_count(), graph.node_count() - 1);
    assert!(graph.is_tree());

    let trunks_to_core = topology
        .links
        .iter()
        .filter(|l| l.touches("s1"))
        .count();
    assert_eq!(trunks_to_core, 2);
    let access_uplinks = topology
        .switches_in(Tier::Access)
        .map(|s| {
            topology
                .links_of(&s.name)
                .filter(|l| l.kind == LinkKind::Trunk)
                .count()
        })
        .sum::<usize>();
    assert_eq!(access_uplinks, 4);
}

/// Exactly one simple path between any two hosts
#[test]
fn test_unique_paths_between_hosts() {
    let topology = default_topology();
    let graph = LinkGraph::from(&topology);
    for a in &topology.hosts {
        for b in &topology.hosts {
            if a.name != b.name {
                let paths = graph.simple_path_count(&a.name, &b.name);
                assert_eq!(paths, 1, "{} -> {}", a.name, b.name);
            }
        }
    }
}

/// All-pairs ping over a started network drops nothing
#[test]
fn test_all_pairs_ping_scenario() {
    let report = orchestrator::run(&default_topology(), SimEmulator::new(), &mut Detached).unwrap();
    assert_eq!(report.reachability.sent(), 56);
    assert_eq!(report.reachability.received(), 56);
    assert_eq!(report.reachability.dropped_percent(), 0);
}

/// h1 and h5 sit in different subnets and meet at the core switch
#[test]
fn test_cross_subnet_path_scenario() {
    let topology = default_topology();
    assert_eq!(topology.host("h1").unwrap().address.to_string(), "10.0.0.1/24");
    assert_eq!(topology.host("h5").unwrap().address.to_string(), "10.0.1.1/24");

    let mut emulator = SimEmulator::new();
    orchestrator::declare_topology(&mut emulator, &topology).unwrap();
    let mut network = emulator.start().unwrap();

    let path = network.path("h1", "h5").unwrap().unwrap();
    assert_eq!(path, ["h1", "s4", "s2", "s1", "s3", "s6", "h5"]);

    let outcome = network.ping("h1", "h5").unwrap();
    assert!(outcome.received);
    assert_eq!(outcome.rtt, Some(Duration::from_millis(28)));
    network.stop().unwrap();
}

/// Two independent builds produce the same topology, and the emulator ends up
/// with the same graph whatever order the links are declared in
#[test]
fn test_construction_is_order_independent() {
    let first = default_topology();
    let second = default_topology();
    assert_eq!(first, second);

    let reference = LinkGraph::from(&first);
    let mut rng = StdRng::seed_from_u64(6633);

    for _ in 0..20 {
        let mut shuffled = second.clone();
        shuffled.links.shuffle(&mut rng);
        assert_eq!(LinkGraph::from(&shuffled), reference);

        let mut emulator = SimEmulator::new();
        orchestrator::declare_topology(&mut emulator, &shuffled).unwrap();
        let mut network = emulator.start().unwrap();
        for a in ["h1", "h4", "h8"] {
            for b in ["h2", "h5", "h7"] {
                assert_eq!(network.path(a, b).unwrap(), reference.path(a, b));
            }
        }
        assert!(network.ping_all().unwrap().all_received());
        network.stop().unwrap();
    }
}

/// Nine hosts with the formula repeat an address inside the second subnet
#[test]
fn test_ninth_host_collides() {
    let config = TopologyConfig::default();
    let mut registry = AddressRegistry::new();
    let mut collisions = BTreeSet::new();

    for index in 1..=9 {
        let address = host_address(index, &config.subnets, config.hosts.per_subnet).unwrap();
        if let Err(owner) = registry.register(&address, &format!("h{}", index)) {
            collisions.insert((owner, format!("h{}", index), address.to_string()));
        }
    }

    assert_eq!(collisions.len(), 1);
    let (owner, newcomer, address) = collisions.into_iter().next().unwrap();
    assert_eq!(owner, "h5");
    assert_eq!(newcomer, "h9");
    assert_eq!(address, "10.0.1.1/24");

    let mut config = TopologyConfig::default();
    config.hosts.count = 9;
    config.hosts.per_access_switch = 3;
    assert!(build_topology(&config).is_err());
}

/// JSON dumps of the built topology carry addresses and shaping as strings
#[test]
fn test_topology_json_dump() {
    let topology = default_topology();
    let json = serde_json::to_value(&topology).unwrap();

    assert_eq!(json["controller"]["address"], "127.0.0.1:6633");
    assert_eq!(json["hosts"][4]["address"], "10.0.1.1/24");
    assert_eq!(json["switches"][0]["tier"], "core");
    assert_eq!(json["links"][0]["shaping"]["bandwidth"], 50);
    assert_eq!(json["links"][0]["shaping"]["delay"], "2ms");
    assert!(json["links"][13]["shaping"].get("delay").is_none());
}
