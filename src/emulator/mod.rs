//! Network emulator interface.
//!
//! An [`Emulator`] collects controller, switch, host and link declarations
//! and, once started, hands back a [`Network`] handle. All probing and the
//! final stop go through that handle; nothing is tracked in global state.
//! [`ScopedNetwork`] wraps the handle so the network is stopped on every exit
//! path, including errors and panics after start.

pub mod mininet;
pub mod ping;
pub mod sim;

pub use mininet::{render_script, write_script, ScriptOptions};
pub use ping::{PingOutcome, PingReport};
pub use sim::{SimEmulator, SimNetwork};

use crate::topology::types::{Controller, Host, Link, Switch};
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};

/// Errors surfaced by an emulator backend
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    #[error("Controller '{name}' at {address} is unreachable: {reason}")]
    ControllerUnreachable { name: String, address: SocketAddr, reason: String },
    #[error("No controller registered")]
    MissingController,
    #[error("A controller is already registered ({0})")]
    ControllerAlreadyRegistered(String),
    #[error("Resource limit reached: {0}")]
    ResourceExhausted(String),
    #[error("Node '{0}' is already declared")]
    DuplicateNode(String),
    #[error("Unknown node '{0}'")]
    UnknownNode(String),
    #[error("Link {0} is already declared")]
    DuplicateLink(String),
    #[error("Network is not running")]
    NotRunning,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Declaration side of an emulator.
///
/// Declarations are only accepted before [`Emulator::start`], which consumes
/// the emulator so no node or link can be added to a running network.
pub trait Emulator {
    type Network: Network;

    fn add_controller(&mut self, controller: &Controller) -> Result<(), EmulatorError>;

    fn add_switch(&mut self, switch: &Switch) -> Result<(), EmulatorError>;

    fn add_host(&mut self, host: &Host) -> Result<(), EmulatorError>;

    fn add_link(&mut self, link: &Link) -> Result<(), EmulatorError>;

    /// Bring the network up. Blocks until the network is live.
    fn start(self) -> Result<Self::Network, EmulatorError>;
}

/// A running emulated network
pub trait Network {
    /// Host names in declaration order
    fn hosts(&self) -> Vec<String>;

    /// Send one probe from `src` to `dst`
    fn ping(&mut self, src: &str, dst: &str) -> Result<PingOutcome, EmulatorError>;

    /// Probe every ordered pair of distinct hosts
    fn ping_all(&mut self) -> Result<PingReport, EmulatorError> {
        let hosts = self.hosts();
        let mut outcomes = Vec::with_capacity(hosts.len() * hosts.len().saturating_sub(1));
        for src in &hosts {
            for dst in hosts.iter().filter(|dst| *dst != src) {
                outcomes.push(self.ping(src, dst)?);
            }
        }
        Ok(PingReport { outcomes })
    }

    fn is_running(&self) -> bool;

    /// Release every resource held by the network. Stopping twice is a no-op.
    fn stop(&mut self) -> Result<(), EmulatorError>;
}

/// Owns a running network and stops it when dropped
#[derive(Debug)]
pub struct ScopedNetwork<N: Network> {
    inner: N,
}

impl<N: Network> ScopedNetwork<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    /// Stop the network on the normal path, reporting any failure
    pub fn stop(mut self) -> Result<(), EmulatorError> {
        self.inner.stop()
    }
}

impl<N: Network> Deref for ScopedNetwork<N> {
    type Target = N;

    fn deref(&self) -> &N {
        &self.inner
    }
}

impl<N: Network> DerefMut for ScopedNetwork<N> {
    fn deref_mut(&mut self) -> &mut N {
        &mut self.inner
    }
}

impl<N: Network> Drop for ScopedNetwork<N> {
    fn drop(&mut self) {
        if !self.inner.is_running() {
            return;
        }
        log::warn!("Network still running on early exit, stopping it");
        if let Err(e) = self.inner.stop() {
            log::error!("Failed to stop network: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Recording {
        running: bool,
        stops: Rc<Cell<usize>>,
    }

    impl Recording {
        fn running(stops: &Rc<Cell<usize>>) -> Self {
            Self { running: true, stops: Rc::clone(stops) }
        }
    }

    impl Network for Recording {
        fn hosts(&self) -> Vec<String> {
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        }

        fn ping(&mut self, src: &str, dst: &str) -> Result<PingOutcome, EmulatorError> {
            if src == "c" {
                return Err(EmulatorError::UnknownNode(src.to_string()));
            }
            Ok(PingOutcome::lost(src, dst))
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn stop(&mut self) -> Result<(), EmulatorError> {
            if self.running {
                self.stops.set(self.stops.get() + 1);
                self.running = false;
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_ping_all_propagates_probe_errors() {
        let stops = Rc::new(Cell::new(0));
        let mut network = Recording::running(&stops);
        // "c" fails as a source
        assert!(matches!(network.ping_all(), Err(EmulatorError::UnknownNode(n)) if n == "c"));
    }

    #[test]
    fn test_explicit_stop_runs_once() {
        let stops = Rc::new(Cell::new(0));
        let scoped = ScopedNetwork::new(Recording::running(&stops));
        assert!(scoped.is_running());
        scoped.stop().unwrap();
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn test_drop_stops_running_network() {
        let stops = Rc::new(Cell::new(0));
        let run = || -> Result<(), EmulatorError> {
            let mut scoped = ScopedNetwork::new(Recording::running(&stops));
            scoped.ping_all()?;
            scoped.stop()
        };
        assert!(run().is_err());
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn test_drop_after_unwind_stops_network() {
        let stops = Rc::new(Cell::new(0));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scoped = ScopedNetwork::new(Recording::running(&stops));
            panic!("session crashed");
        }));
        assert!(result.is_err());
        assert_eq!(stops.get(), 1);
    }
}
