//! Network topology module.
//!
//! This module contains the topology data model, the builder that turns a
//! declarative configuration into a topology, and graph analysis over the
//! declared links.

pub mod builder;
pub mod graph;
pub mod types;

// Re-export key types and functions for easier access
pub use builder::{assign_addresses, build_topology};
pub use graph::LinkGraph;
pub use types::{Controller, Host, Link, LinkKind, LinkShaping, Switch, Tier, Topology};
