//! Interactive command loop over a running network.
//!
//! Reads one command per line until `exit`, `quit` or end of input. A
//! command that fails prints its error and the loop carries on; only I/O
//! errors on the session's own streams end it early.

use crate::emulator::Network;
use crate::topology::graph::LinkGraph;
use crate::topology::types::Topology;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Commands:
  nodes              list all nodes
  links              list all links with their shaping
  net                list each node's neighbours
  dump               show node details and addresses
  pingall            probe every ordered pair of hosts
  ping <src> <dst>   probe one pair of hosts
  path <a> <b>       show the path between two nodes
  help               show this message
  exit | quit        leave the session";

/// Something that takes over once the network is up and returns when done
pub trait Session {
    fn enter<N: Network>(&mut self, topology: &Topology, network: &mut N) -> io::Result<()>;
}

/// Session that returns immediately, for non-interactive runs
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Session for Detached {
    fn enter<N: Network>(&mut self, _topology: &Topology, _network: &mut N) -> io::Result<()> {
        log::info!("Interactive session skipped");
        Ok(())
    }
}

/// Line-oriented shell reading commands from `input` and answering on `output`
pub struct Shell<R, W> {
    input: R,
    output: W,
    prompt: String,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output, prompt: "tiernet> ".to_string() }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run one command. Returns `false` when the session should end.
    fn execute<N: Network>(
        &mut self,
        line: &str,
        topology: &Topology,
        network: &mut N,
    ) -> io::Result<bool> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let out = &mut self.output;
        match words.as_slice() {
            [] => {}
            ["exit"] | ["quit"] => return Ok(false),
            ["help"] => writeln!(out, "{}", HELP)?,
            ["nodes"] => {
                writeln!(out, "available nodes are:")?;
                let names: Vec<&str> = topology
                    .hosts
                    .iter()
                    .map(|h| h.name.as_str())
                    .chain(topology.switches.iter().map(|s| s.name.as_str()))
                    .collect();
                writeln!(out, "{}", names.join(" "))?;
            }
            ["links"] => {
                for link in &topology.links {
                    writeln!(out, "{}", link)?;
                }
            }
            ["net"] => {
                let graph = LinkGraph::from(topology);
                for name in topology
                    .hosts
                    .iter()
                    .map(|h| h.name.as_str())
                    .chain(topology.switches.iter().map(|s| s.name.as_str()))
                {
                    let neighbors: Vec<&str> = graph.neighbors(name).collect();
                    writeln!(out, "{}: {}", name, neighbors.join(" "))?;
                }
            }
            ["dump"] => {
                let c = &topology.controller;
                writeln!(out, "<Controller {}: {}>", c.name, c.address)?;
                for switch in &topology.switches {
                    writeln!(out, "<Switch {}: {}>", switch.name, switch.tier)?;
                }
                for host in &topology.hosts {
                    writeln!(out, "<Host {}: {}>", host.name, host.address)?;
                }
            }
            ["pingall"] => match network.ping_all() {
                Ok(report) => writeln!(out, "{}", report)?,
                Err(e) => writeln!(out, "*** Error: {}", e)?,
            },
            ["ping", src, dst] => match network.ping(src, dst) {
                Ok(outcome) => writeln!(out, "{}", outcome)?,
                Err(e) => writeln!(out, "*** Error: {}", e)?,
            },
            ["path", a, b] => match LinkGraph::from(topology).path(a, b) {
                Some(path) => writeln!(out, "{}", path.join(" -> "))?,
                None => writeln!(out, "*** No path between {} and {}", a, b)?,
            },
            [cmd, ..] => writeln!(out, "*** Unknown command: {} (try 'help')", cmd)?,
        }
        Ok(true)
    }
}

impl<R: BufRead, W: Write> Session for Shell<R, W> {
    fn enter<N: Network>(&mut self, topology: &Topology, network: &mut N) -> io::Result<()> {
        log::info!("Entering interactive session");
        let mut line = String::new();
        loop {
            write!(self.output, "{}", self.prompt)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            let command = line.trim().to_string();
            if !self.execute(&command, topology, network)? {
                break;
            }
        }
        log::info!("Interactive session finished");
        Ok(())
    }
}
