//! Topology run orchestrator.
//!
//! Drives one emulated network through its whole life: declare the
//! controller, switches, hosts and links, start, probe all host pairs, hand
//! over to an interactive session, and stop. The running network is held in
//! a [`ScopedNetwork`], so it is stopped even when probing or the session
//! fails.

use crate::emulator::{Emulator, Network, PingReport, ScopedNetwork};
use crate::shell::Session;
use crate::topology::types::{Tier, Topology};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use serde::Serialize;

/// What a completed run observed
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub switches: usize,
    pub hosts: usize,
    pub links: usize,
    pub reachability: PingReport,
}

/// Declare every entity of `topology` in dependency order
pub fn declare_topology<E: Emulator>(emulator: &mut E, topology: &Topology) -> Result<()> {
    let controller = &topology.controller;
    info!("*** Adding controller {} at {}", controller.name, controller.address);
    emulator
        .add_controller(controller)
        .wrap_err_with(|| format!("Failed to register controller '{}'", controller.name))?;

    info!("*** Adding switches");
    for tier in [Tier::Core, Tier::Aggregation, Tier::Access] {
        for switch in topology.switches_in(tier) {
            emulator
                .add_switch(switch)
                .wrap_err_with(|| format!("Failed to add switch '{}'", switch.name))?;
        }
    }

    info!("*** Adding hosts");
    for host in &topology.hosts {
        emulator
            .add_host(host)
            .wrap_err_with(|| format!("Failed to add host '{}'", host.name))?;
    }

    info!("*** Adding links");
    for link in &topology.links {
        emulator
            .add_link(link)
            .wrap_err_with(|| format!("Failed to add link {}", link))?;
    }

    Ok(())
}

/// Run the full lifecycle of one emulated network
///
/// Each call creates, probes and tears down an independent network. Errors
/// while declaring or starting abort the run; a partially failed
/// reachability check is only reported.
pub fn run<E, S>(topology: &Topology, mut emulator: E, session: &mut S) -> Result<RunReport>
where
    E: Emulator,
    S: Session,
{
    declare_topology(&mut emulator, topology)?;

    info!("*** Starting network");
    let network = emulator.start().wrap_err("Failed to start the emulated network")?;
    let mut network = ScopedNetwork::new(network);
    info!("Topology is up. Use 'pingall' in the shell to test connectivity.");

    info!("*** Ping: testing reachability between all hosts");
    let reachability = network.ping_all().wrap_err("Reachability check failed")?;
    for line in reachability.to_string().lines() {
        info!("{}", line);
    }
    if !reachability.all_received() {
        let lost: Vec<String> = reachability
            .failures()
            .map(|o| format!("{}->{}", o.src, o.dst))
            .collect();
        warn!(
            "{} of {} probes got no reply: {}",
            lost.len(),
            reachability.sent(),
            lost.join(" ")
        );
    }

    session
        .enter(topology, &mut *network)
        .wrap_err("Interactive session failed")?;

    info!("*** Stopping network");
    network.stop().wrap_err("Failed to stop the emulated network")?;

    Ok(RunReport {
        switches: topology.switches.len(),
        hosts: topology.hosts.len(),
        links: topology.links.len(),
        reachability,
    })
}
