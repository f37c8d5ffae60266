use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tiernet::config::TopologyConfig;
use tiernet::config_loader::{self, CliOverrides};
use tiernet::emulator::{self, ScriptOptions, SimEmulator};
use tiernet::orchestrator;
use tiernet::shell::{Detached, Shell};
use tiernet::topology::{build_topology, Topology};

/// Where the topology is brought up
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process simulated emulator
    Sim,
    /// Render a Mininet script to run as root on a Mininet host
    Mininet,
}

/// Build a three-tier SDN topology, start it, check reachability and open a shell
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML topology description (defaults to the built-in three-tier tree)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the interactive session after the reachability check
    #[arg(long)]
    no_cli: bool,

    /// Do not probe the controller's control channel before starting
    #[arg(long)]
    no_controller_probe: bool,

    /// Write the built topology as JSON to this path
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Build and validate the topology, print it, and exit without starting
    #[arg(long)]
    dry_run: bool,

    /// Emulator backend
    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// Output path of the Mininet script
    #[arg(long, default_value = "tiernet_topo.py")]
    script: PathBuf,

    /// Write the effective topology description (after overrides) as YAML
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// One line per host address, then one line per link
fn dry_run_listing(topology: &Topology) -> String {
    let hosts = topology.hosts.iter().map(|h| format!("{} {}", h.name, h.address));
    let links = topology.links.iter().map(|l| l.to_string());
    hosts.chain(links).map(|line| line + "\n").collect()
}

fn write_dump(topology: &Topology, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(topology)?;
    fs::write(path, json)
        .wrap_err_with(|| format!("Failed to write topology dump '{}'", path.display()))?;
    info!("Topology written to {:?}", path);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => {
            info!("No topology file given, using the default three-tier tree");
            TopologyConfig::default()
        }
    };
    config_loader::apply_overrides(
        &mut config,
        &CliOverrides { skip_controller_probe: args.no_controller_probe },
    )?;
    if let Some(path) = &args.save_config {
        config_loader::save_config(&config, path)?;
    }

    let topology = build_topology(&config).wrap_err("Invalid topology")?;
    info!(
        "Topology: {} switches, {} hosts, {} links",
        topology.switches.len(),
        topology.hosts.len(),
        topology.links.len()
    );

    if let Some(path) = &args.dump {
        write_dump(&topology, path)?;
    }

    if args.dry_run {
        print!("{}", dry_run_listing(&topology));
        return Ok(());
    }

    if args.backend == Backend::Mininet {
        let options = ScriptOptions { interactive: !args.no_cli };
        emulator::write_script(&topology, &options, &args.script)?;
        info!("Run it on a Mininet host with: sudo python3 {}", args.script.display());
        return Ok(());
    }

    let report = if args.no_cli {
        orchestrator::run(&topology, SimEmulator::new(), &mut Detached)?
    } else {
        let stdin = io::stdin();
        let mut shell = Shell::new(stdin.lock(), io::stdout());
        orchestrator::run(&topology, SimEmulator::new(), &mut shell)?
    };

    info!("{}", report.reachability.summary());
    info!("Run completed");
    Ok(())
}
