//! # Tiernet - Three-tier SDN topology builder for network emulators
//!
//! This library describes a core/aggregation/access switch tree with its
//! hosts and remote flow controller, declares it to a network emulator,
//! starts it, checks reachability between every pair of hosts and hands the
//! running network to an interactive session.
//!
//! ## Overview
//!
//! The topology is data, not control flow. A [`config::TopologyConfig`]
//! (YAML, with defaults for the standard tree) is turned into an immutable
//! [`topology::Topology`] by [`topology::build_topology`], which derives host
//! addresses from a pure formula and checks that the link graph is a tree.
//! [`orchestrator::run`] then walks the topology through an
//! [`emulator::Emulator`] and stops the network on every exit path.
//!
//! ## Default Topology
//!
//! ```text
//!                    s1 (core)
//!           50Mbit/2ms /   \ 50Mbit/2ms
//!                    s2     s3 (aggregation)
//!       30Mbit/5ms  /  \   /  \  30Mbit/5ms
//!                 s4   s5 s6   s7 (access)
//!                /  \  ..  ..  /  \
//!               h1  h2        h7  h8
//! ```
//!
//! Hosts h1-h4 live in `10.0.0.0/24` (`.1`-`.4`), hosts h5-h8 in
//! `10.0.1.0/24` (`.1`-`.4`). The controller is expected on
//! `127.0.0.1:6633`.
//!
//! ## Architecture
//!
//! - `config`: Declarative topology description and validation
//! - `config_loader`: YAML loading, CLI overrides
//! - `ip`: Address formula, subnets and collision registry
//! - `topology`: Data model, builder and link graph
//! - `emulator`: Emulator/network traits, scoped network handle, simulated
//!   backend and Mininet script renderer
//! - `shell`: Interactive command loop
//! - `orchestrator`: The declare/start/probe/session/stop sequence
//! - `utils`: Delay formatting and structural validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tiernet::config::TopologyConfig;
//! use tiernet::emulator::SimEmulator;
//! use tiernet::orchestrator;
//! use tiernet::shell::Detached;
//! use tiernet::topology::build_topology;
//!
//! let topology = build_topology(&TopologyConfig::default())?;
//! let report = orchestrator::run(&topology, SimEmulator::new(), &mut Detached)?;
//! println!("{}", report.reachability.summary());
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Module seams return typed errors (`ValidationError`, `AddressError`,
//! `EmulatorError`) built with `thiserror`. Application-level functions
//! return `color_eyre::Result` with context attached.

pub mod config;
pub mod config_loader;
pub mod emulator;
pub mod ip;
pub mod orchestrator;
pub mod shell;
pub mod topology;
pub mod utils;
