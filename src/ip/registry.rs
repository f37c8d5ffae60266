//! Address registry.
//!
//! Tracks which host owns which address so that collisions produced by the
//! address formula are reported instead of silently shared.

use super::allocator::HostAddress;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Registry of assigned host addresses
#[derive(Debug, Default)]
pub struct AddressRegistry {
    /// IP -> owning host name
    assigned: BTreeMap<Ipv4Addr, String>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` for `host`.
    ///
    /// Re-registering the same address for the same host is accepted. If a
    /// different host already owns it the owner's name is returned as the error.
    pub fn register(&mut self, address: &HostAddress, host: &str) -> Result<(), String> {
        match self.assigned.get(&address.ip) {
            Some(owner) if owner != host => Err(owner.clone()),
            Some(_) => Ok(()),
            None => {
                self.assigned.insert(address.ip, host.to_string());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
