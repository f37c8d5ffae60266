//! Mininet script backend.
//!
//! Renders a built topology as a standalone Mininet program: a remote
//! controller, `TCLink` shaping on trunk links, then start, all-pairs ping,
//! the Mininet CLI and stop. The script is meant to be run as root on a host
//! with Mininet installed; `net.stop()` sits in a `finally` block so the
//! network is torn down on every exit path.

use super::EmulatorError;
use crate::topology::types::{Link, Tier, Topology};
use crate::utils::format_delay;
use std::path::Path;

/// What the rendered script does after the network is up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Drop into the Mininet CLI after the reachability check
    pub interactive: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self { interactive: true }
    }
}

/// Python string literal for `value`
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn node(name: &str) -> String {
    format!("nodes[{}]", quote(name))
}

fn link_line(link: &Link) -> String {
    let mut args = vec![node(&link.a), node(&link.b)];
    if let Some(bw) = link.shaping.bandwidth {
        args.push(format!("bw={}", bw));
    }
    if let Some(delay) = link.shaping.delay {
        args.push(format!("delay={}", quote(&format_delay(delay))));
    }
    format!("    net.addLink({})", args.join(", "))
}

/// Render `topology` as a Mininet Python program
pub fn render_script(topology: &Topology, options: &ScriptOptions) -> String {
    let controller = &topology.controller;
    let mut lines = vec![
        "#!/usr/bin/env python3".to_string(),
        format!(
            "# Three-tier topology: {} switches, {} hosts, {} links",
            topology.switches.len(),
            topology.hosts.len(),
            topology.links.len()
        ),
        "from mininet.net import Mininet".to_string(),
        "from mininet.node import RemoteController".to_string(),
        "from mininet.cli import CLI".to_string(),
        "from mininet.link import TCLink".to_string(),
        "from mininet.log import setLogLevel".to_string(),
        String::new(),
        String::new(),
        "def run():".to_string(),
        "    net = Mininet(controller=RemoteController, link=TCLink)".to_string(),
        "    nodes = {}".to_string(),
        String::new(),
        format!(
            "    net.addController({}, controller=RemoteController, ip={}, port={})",
            quote(&controller.name),
            quote(&controller.address.ip().to_string()),
            controller.address.port()
        ),
        String::new(),
    ];

    for tier in [Tier::Core, Tier::Aggregation, Tier::Access] {
        for switch in topology.switches_in(tier) {
            lines.push(format!(
                "    {} = net.addSwitch({})",
                node(&switch.name),
                quote(&switch.name)
            ));
        }
    }
    lines.push(String::new());

    for host in &topology.hosts {
        lines.push(format!(
            "    {} = net.addHost({}, ip={})",
            node(&host.name),
            quote(&host.name),
            quote(&host.address.to_string())
        ));
    }
    lines.push(String::new());

    lines.extend(topology.links.iter().map(link_line));
    lines.push(String::new());

    lines.push("    try:".to_string());
    lines.push("        net.start()".to_string());
    lines.push(
        "        print(\"Topology is up. Use 'pingall' in the CLI to test connectivity.\")"
            .to_string(),
    );
    lines.push("        net.pingAll()".to_string());
    if options.interactive {
        lines.push("        CLI(net)".to_string());
    }
    lines.push("    finally:".to_string());
    lines.push("        net.stop()".to_string());
    lines.push(String::new());
    lines.push(String::new());
    lines.push("if __name__ == \"__main__\":".to_string());
    lines.push("    setLogLevel(\"info\")".to_string());
    lines.push("    run()".to_string());

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

/// Render `topology` and write it to `path`
pub fn write_script(
    topology: &Topology,
    options: &ScriptOptions,
    path: &Path,
) -> Result<(), EmulatorError> {
    let script = render_script(topology, options);
    std::fs::write(path, script)?;
    log::info!("Wrote Mininet script to {:?}", path);
    Ok(())
}
