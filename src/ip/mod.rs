//! IP address assignment module.
//!
//! This module derives host addresses from their index and the declared
//! subnets, and keeps a registry that detects duplicate assignments.

pub mod allocator;
pub mod registry;

// Re-export commonly used types
pub use allocator::{address_capacity, host_address, AddressError, HostAddress, Subnet};
pub use registry::AddressRegistry;
