//! In-process emulator backend.
//!
//! Models the declared network as a link graph. A probe succeeds when the
//! network is running and a path joins the two hosts; its round-trip time is
//! twice the sum of the one-way delays along that path. Starting the network
//! optionally checks that the controller accepts TCP connections, the same
//! way switches would open their control channel.

use super::{Emulator, EmulatorError, Network, PingOutcome};
use crate::topology::graph::LinkGraph;
use crate::topology::types::{Controller, Host, Link, Switch};
use std::collections::{HashMap, HashSet};
use std::net::TcpStream;
use std::time::Duration;

type LinkKey = (String, String);

fn link_key(link: &Link) -> LinkKey {
    let (a, b) = link.key();
    (a.to_string(), b.to_string())
}

/// Declaration state of the simulated emulator
#[derive(Debug, Default)]
pub struct SimEmulator {
    controller: Option<Controller>,
    switches: Vec<Switch>,
    hosts: Vec<Host>,
    links: Vec<Link>,
    link_keys: HashSet<LinkKey>,
    /// Virtual interfaces created so far
    interfaces: usize,
    /// Maximum number of virtual interfaces
    interface_limit: Option<usize>,
}

impl SimEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulator that runs out of virtual interfaces after `limit`
    pub fn with_interface_limit(limit: usize) -> Self {
        Self { interface_limit: Some(limit), ..Self::default() }
    }

    fn is_host(&self, name: &str) -> bool {
        self.hosts.iter().any(|h| h.name == name)
    }

    /// Reserve `count` interfaces for `what`, failing past the limit
    fn reserve_interfaces(&mut self, count: usize, what: &str) -> Result<(), EmulatorError> {
        if let Some(limit) = self.interface_limit {
            if self.interfaces.saturating_add(count) > limit {
                return Err(EmulatorError::ResourceExhausted(format!(
                    "cannot create interfaces for {}: limit of {} reached",
                    what, limit
                )));
            }
        }
        self.interfaces += count;
        Ok(())
    }

    fn has_node(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s.name == name) || self.is_host(name)
    }

    fn check_new_node(&self, name: &str) -> Result<(), EmulatorError> {
        if self.has_node(name) {
            return Err(EmulatorError::DuplicateNode(name.to_string()));
        }
        Ok(())
    }

    fn probe_controller(controller: &Controller) -> Result<(), EmulatorError> {
        log::info!("Connecting to controller '{}' at {}", controller.name, controller.address);
        match TcpStream::connect_timeout(&controller.address, controller.probe_timeout) {
            Ok(_) => {
                log::debug!("Controller '{}' accepted the control channel", controller.name);
                Ok(())
            }
            Err(e) => Err(EmulatorError::ControllerUnreachable {
                name: controller.name.clone(),
                address: controller.address,
                reason: e.to_string(),
            }),
        }
    }
}

impl Emulator for SimEmulator {
    type Network = SimNetwork;

    fn add_controller(&mut self, controller: &Controller) -> Result<(), EmulatorError> {
        if let Some(existing) = &self.controller {
            return Err(EmulatorError::ControllerAlreadyRegistered(existing.name.clone()));
        }
        log::debug!("Registered controller {} ({})", controller.name, controller.address);
        self.controller = Some(controller.clone());
        Ok(())
    }

    fn add_switch(&mut self, switch: &Switch) -> Result<(), EmulatorError> {
        self.check_new_node(&switch.name)?;
        log::debug!("Added {} switch {}", switch.tier, switch.name);
        self.switches.push(switch.clone());
        Ok(())
    }

    fn add_host(&mut self, host: &Host) -> Result<(), EmulatorError> {
        self.check_new_node(&host.name)?;
        // A host owns its single interface; the edge link attaches to it
        self.reserve_interfaces(1, &host.name)?;
        log::debug!("Added host {} ({})", host.name, host.address);
        self.hosts.push(host.clone());
        Ok(())
    }

    fn add_link(&mut self, link: &Link) -> Result<(), EmulatorError> {
        for end in [&link.a, &link.b] {
            if !self.has_node(end) {
                return Err(EmulatorError::UnknownNode(end.clone()));
            }
        }
        let key = link_key(link);
        if self.link_keys.contains(&key) {
            return Err(EmulatorError::DuplicateLink(format!("{}<->{}", key.0, key.1)));
        }
        let switch_ends = [link.a.as_str(), link.b.as_str()]
            .iter()
            .filter(|end| !self.is_host(end))
            .count();
        self.reserve_interfaces(switch_ends, &link.to_string())?;
        log::debug!("Added link {}", link);
        self.link_keys.insert(key);
        self.links.push(link.clone());
        Ok(())
    }

    fn start(self) -> Result<SimNetwork, EmulatorError> {
        let controller = self.controller.as_ref().ok_or(EmulatorError::MissingController)?;

        if controller.probe {
            Self::probe_controller(controller)?;
        } else {
            log::warn!(
                "Controller probe disabled; assuming '{}' installs default forwarding",
                controller.name
            );
        }

        let nodes = self
            .switches
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.hosts.iter().map(|h| h.name.as_str()));
        let graph = LinkGraph::new(nodes, &self.links);

        let delays = self
            .links
            .iter()
            .map(|l| (link_key(l), l.shaping.delay.unwrap_or_default()))
            .collect();

        let interfaces = self.interfaces;
        log::info!(
            "Network up: {} switches, {} hosts, {} links ({} interfaces)",
            self.switches.len(),
            self.hosts.len(),
            self.links.len(),
            interfaces
        );

        Ok(SimNetwork {
            hosts: self.hosts.iter().map(|h| h.name.clone()).collect(),
            graph,
            delays,
            interfaces,
            running: true,
        })
    }
}

/// A running simulated network
#[derive(Debug)]
pub struct SimNetwork {
    hosts: Vec<String>,
    graph: LinkGraph,
    delays: HashMap<LinkKey, Duration>,
    interfaces: usize,
    running: bool,
}

impl SimNetwork {
    /// Nodes a probe from `src` to `dst` traverses, both ends included
    pub fn path(&self, src: &str, dst: &str) -> Result<Option<Vec<String>>, EmulatorError> {
        if !self.running {
            return Err(EmulatorError::NotRunning);
        }
        Ok(self.graph.path(src, dst))
    }

    pub fn interfaces(&self) -> usize {
        self.interfaces
    }

    fn one_way_delay(&self, path: &[String]) -> Duration {
        path.windows(2)
            .map(|hop| {
                let key = if hop[0] <= hop[1] {
                    (hop[0].clone(), hop[1].clone())
                } else {
                    (hop[1].clone(), hop[0].clone())
                };
                self.delays.get(&key).copied().unwrap_or_default()
            })
            .sum()
    }
}

impl Network for SimNetwork {
    fn hosts(&self) -> Vec<String> {
        self.hosts.clone()
    }

    fn ping(&mut self, src: &str, dst: &str) -> Result<PingOutcome, EmulatorError> {
        if !self.running {
            return Err(EmulatorError::NotRunning);
        }
        for host in [src, dst] {
            if !self.hosts.iter().any(|h| h == host) {
                return Err(EmulatorError::UnknownNode(host.to_string()));
            }
        }

        match self.graph.path(src, dst) {
            Some(path) => {
                let rtt = self.one_way_delay(&path) * 2;
                log::trace!("{} -> {} via {}", src, dst, path.join(" "));
                Ok(PingOutcome::reply(src, dst, rtt))
            }
            None => Ok(PingOutcome::lost(src, dst)),
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn stop(&mut self) -> Result<(), EmulatorError> {
        if !self.running {
            return Ok(());
        }
        log::info!("Stopping network: releasing {} interfaces", self.interfaces);
        self.running = false;
        self.graph = LinkGraph::default();
        self.delays.clear();
        self.interfaces = 0;
        Ok(())
    }
}
