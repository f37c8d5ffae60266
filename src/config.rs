use crate::ip::{address_capacity, AddressError, Subnet};
use crate::topology::types::{LinkShaping, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Declarative description of a tiered topology.
///
/// Every field has a default, and the defaults describe the standard
/// three-tier tree: core switch `s1`, aggregation switches `s2`/`s3`, access
/// switches `s4`..`s7`, and eight hosts split over `10.0.0.0/24` and
/// `10.0.1.0/24`, controlled by a remote controller on `127.0.0.1:6633`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default = "default_subnets")]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default = "default_switches")]
    pub switches: Vec<SwitchConfig>,
}

impl TopologyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.controller.validate()?;

        if self.subnets.is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "at least one subnet must be declared".to_string(),
            ));
        }

        self.validate_switches()?;
        self.validate_hosts()?;

        Ok(())
    }

    fn validate_switches(&self) -> Result<(), ValidationError> {
        let mut names = HashSet::new();
        for switch in &self.switches {
            if switch.name.trim().is_empty() {
                return Err(ValidationError::InvalidSwitch(
                    "switch name cannot be empty".to_string(),
                ));
            }
            if !names.insert(switch.name.as_str()) {
                return Err(ValidationError::DuplicateName(switch.name.clone()));
            }
        }

        let cores = self.switches.iter().filter(|s| s.tier == Tier::Core).count();
        if cores != 1 {
            return Err(ValidationError::InvalidSwitch(format!(
                "exactly one core switch is required, found {}",
                cores
            )));
        }

        for switch in &self.switches {
            match (switch.tier.parent(), &switch.uplink) {
                (None, Some(_)) => {
                    return Err(ValidationError::InvalidSwitch(format!(
                        "core switch '{}' cannot have an uplink",
                        switch.name
                    )));
                }
                (None, None) => {}
                (Some(_), None) => {
                    return Err(ValidationError::MissingUplink(switch.name.clone()));
                }
                (Some(expected), Some(uplink)) => {
                    let parent = self
                        .switch(&uplink.to)
                        .ok_or_else(|| ValidationError::UnknownUplink {
                            switch: switch.name.clone(),
                            to: uplink.to.clone(),
                        })?;
                    if parent.tier != expected {
                        return Err(ValidationError::TierMismatch {
                            switch: switch.name.clone(),
                            tier: switch.tier,
                            to: parent.name.clone(),
                            to_tier: parent.tier,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_hosts(&self) -> Result<(), ValidationError> {
        let hosts = &self.hosts;
        if hosts.name_prefix.trim().is_empty() {
            return Err(ValidationError::InvalidHosts("name_prefix cannot be empty".to_string()));
        }
        if hosts.per_subnet == 0 || hosts.per_access_switch == 0 {
            return Err(ValidationError::InvalidHosts(
                "per_subnet and per_access_switch must be at least 1".to_string(),
            ));
        }

        let access = self.switches.iter().filter(|s| s.tier == Tier::Access).count();
        if hosts.count > 0 && access == 0 {
            return Err(ValidationError::InvalidHosts(
                "hosts require at least one access switch".to_string(),
            ));
        }
        let attach_capacity = access.saturating_mul(hosts.per_access_switch);
        if hosts.count > attach_capacity {
            return Err(ValidationError::AccessCapacity {
                hosts: hosts.count,
                capacity: attach_capacity,
            });
        }

        // Past this bound the address formula repeats addresses
        let capacity = address_capacity(&self.subnets, hosts.per_subnet);
        if hosts.count > capacity {
            return Err(ValidationError::AddressCapacity { hosts: hosts.count, capacity });
        }
        for subnet in &self.subnets {
            if hosts.per_subnet as u64 > subnet.usable_hosts() {
                return Err(ValidationError::Address(AddressError::SubnetTooSmall {
                    subnet: *subnet,
                    hosts: hosts.per_subnet,
                }));
            }
        }

        // Host names must not shadow switch names
        for index in 1..=hosts.count {
            let name = hosts.name(index);
            if self.switch(&name).is_some() {
                return Err(ValidationError::DuplicateName(name));
            }
        }

        Ok(())
    }

    pub fn switch(&self, name: &str) -> Option<&SwitchConfig> {
        self.switches.iter().find(|s| s.name == name)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            subnets: default_subnets(),
            hosts: HostsConfig::default(),
            switches: default_switches(),
        }
    }
}

/// Remote controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_controller_name")]
    pub name: String,
    #[serde(default = "default_controller_address")]
    pub address: SocketAddr,
    /// Check the control channel accepts TCP connections before starting
    #[serde(default = "default_true")]
    pub probe: bool,
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl ControllerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidController("name cannot be empty".to_string()));
        }
        if self.address.port() == 0 {
            return Err(ValidationError::InvalidController(
                "control channel port cannot be 0".to_string(),
            ));
        }
        if self.probe && self.probe_timeout.is_zero() {
            return Err(ValidationError::InvalidController(
                "probe_timeout must be positive when probing".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: default_controller_name(),
            address: default_controller_address(),
            probe: true,
            probe_timeout: default_probe_timeout(),
        }
    }
}

/// Host generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostsConfig {
    #[serde(default = "default_host_count")]
    pub count: usize,
    /// Hosts placed in each subnet before moving to the next one
    #[serde(default = "default_per_subnet")]
    pub per_subnet: usize,
    /// Hosts attached to each access switch, in declaration order
    #[serde(default = "default_per_access_switch")]
    pub per_access_switch: usize,
    #[serde(default = "default_host_prefix")]
    pub name_prefix: String,
}

impl HostsConfig {
    /// Name of host `index` (1-based)
    pub fn name(&self, index: usize) -> String {
        format!("{}{}", self.name_prefix, index)
    }
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            count: default_host_count(),
            per_subnet: default_per_subnet(),
            per_access_switch: default_per_access_switch(),
            name_prefix: default_host_prefix(),
        }
    }
}

/// A switch and its link towards the tier above
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub name: String,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink: Option<UplinkConfig>,
}

impl SwitchConfig {
    pub fn core(name: &str) -> Self {
        Self { name: name.to_string(), tier: Tier::Core, uplink: None }
    }

    pub fn below(name: &str, tier: Tier, to: &str, bandwidth: u32, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            tier,
            uplink: Some(UplinkConfig {
                to: to.to_string(),
                bandwidth: Some(bandwidth),
                delay: Some(delay),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkConfig {
    pub to: String,
    /// Mbit/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<u32>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
}

impl UplinkConfig {
    pub fn shaping(&self) -> LinkShaping {
        LinkShaping { bandwidth: self.bandwidth, delay: self.delay }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid controller configuration: {0}")]
    InvalidController(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid switch configuration: {0}")]
    InvalidSwitch(String),
    #[error("Invalid host configuration: {0}")]
    InvalidHosts(String),
    #[error("Duplicate node name '{0}'")]
    DuplicateName(String),
    #[error("Switch '{0}' needs an uplink to the tier above")]
    MissingUplink(String),
    #[error("Switch '{switch}' uplinks to unknown switch '{to}'")]
    UnknownUplink { switch: String, to: String },
    #[error("Switch '{switch}' ({tier}) cannot uplink to '{to}' ({to_tier})")]
    TierMismatch { switch: String, tier: Tier, to: String, to_tier: Tier },
    #[error("{hosts} hosts do not fit on the access switches (capacity {capacity})")]
    AccessCapacity { hosts: usize, capacity: usize },
    #[error(
        "{hosts} hosts exceed the address formula's capacity of {capacity}; addresses would repeat"
    )]
    AddressCapacity { hosts: usize, capacity: usize },
    #[error("Address {address} assigned to both '{first}' and '{second}'")]
    DuplicateAddress { address: String, first: String, second: String },
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
}

fn default_controller_name() -> String {
    "ryuController".to_string()
}

fn default_controller_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 6633))
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_host_count() -> usize {
    8
}

fn default_per_subnet() -> usize {
    4
}

fn default_per_access_switch() -> usize {
    2
}

fn default_host_prefix() -> String {
    "h".to_string()
}

fn default_subnets() -> Vec<Subnet> {
    vec![
        Subnet::from_octets([10, 0, 0, 0], 24),
        Subnet::from_octets([10, 0, 1, 0], 24),
    ]
}

fn default_switches() -> Vec<SwitchConfig> {
    let trunk = Duration::from_millis(2);
    let access = Duration::from_millis(5);
    vec![
        SwitchConfig::core("s1"),
        SwitchConfig::below("s2", Tier::Aggregation, "s1", 50, trunk),
        SwitchConfig::below("s3", Tier::Aggregation, "s1", 50, trunk),
        SwitchConfig::below("s4", Tier::Access, "s2", 30, access),
        SwitchConfig::below("s5", Tier::Access, "s2", 30, access),
        SwitchConfig::below("s6", Tier::Access, "s3", 30, access),
        SwitchConfig::below("s7", Tier::Access, "s3", 30, access),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TopologyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.controller.address.to_string(), "127.0.0.1:6633");
        assert_eq!(config.controller.name, "ryuController");
        assert_eq!(config.switches.len(), 7);
        assert_eq!(config.hosts.count, 8);
        assert_eq!(config.subnets[1].to_string(), "10.0.1.0/24");
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: TopologyConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, TopologyConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
controller:
  address: "10.1.2.3:6653"
  probe: false
hosts:
  count: 4
switches:
  - name: core
    tier: core
  - name: agg
    tier: aggregation
    uplink:
      to: core
      bandwidth: 100
      delay: 1ms
  - name: edge1
    tier: access
    uplink:
      to: agg
  - name: edge2
    tier: access
    uplink:
      to: agg
      delay: 500us
"#;
        let config: TopologyConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.controller.probe);
        assert_eq!(config.controller.name, "ryuController");
        assert_eq!(config.controller.address.port(), 6653);

        let agg = config.switch("agg").unwrap().uplink.as_ref().unwrap();
        assert_eq!(agg.shaping(), LinkShaping::new(100, Duration::from_millis(1)));
        let edge1 = config.switch("edge1").unwrap().uplink.as_ref().unwrap();
        assert!(!edge1.shaping().is_shaped());
        let edge2 = config.switch("edge2").unwrap().uplink.as_ref().unwrap();
        assert_eq!(edge2.delay, Some(Duration::from_micros(500)));
    }

    #[test]
    fn test_host_count_past_address_capacity_is_rejected() {
        let mut config = TopologyConfig::default();
        config.hosts.count = 9;
        // Give the access layer room so the address bound is what trips
        config.hosts.per_access_switch = 3;
        match config.validate() {
            Err(ValidationError::AddressCapacity { hosts, capacity }) => {
                assert_eq!(hosts, 9);
                assert_eq!(capacity, 8);
            }
            other => panic!("expected AddressCapacity, got {:?}", other),
        }
    }

    #[test]
    fn test_huge_host_count_is_rejected_before_naming_hosts() {
        let mut config = TopologyConfig::default();
        config.hosts.count = usize::MAX;
        config.hosts.per_access_switch = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::AddressCapacity { hosts: usize::MAX, capacity: 8 })
        ));
    }

    #[test]
    fn test_capacity_products_saturate() {
        let yaml = "hosts: { count: 1, per_subnet: 18446744073709551615 }";
        let config: TopologyConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Address(AddressError::SubnetTooSmall { .. }))
        ));

        let mut config = TopologyConfig::default();
        config.hosts.per_access_switch = usize::MAX;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_access_capacity() {
        let mut config = TopologyConfig::default();
        config.hosts.per_access_switch = 1;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::AccessCapacity { hosts: 8, capacity: 4 })
        ));
    }

    #[test]
    fn test_switch_validation_errors() {
        let mut config = TopologyConfig::default();
        config.switches.push(SwitchConfig::core("s8"));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSwitch(_))));

        let mut config = TopologyConfig::default();
        config.switches[3].uplink = None;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingUplink(name)) if name == "s4"
        ));

        let mut config = TopologyConfig::default();
        config.switches[4] =
            SwitchConfig::below("s5", Tier::Access, "s9", 30, Duration::from_millis(5));
        assert!(matches!(config.validate(), Err(ValidationError::UnknownUplink { .. })));

        // Access switch hanging straight off the core skips a tier
        let mut config = TopologyConfig::default();
        config.switches[6] =
            SwitchConfig::below("s7", Tier::Access, "s1", 30, Duration::from_millis(5));
        assert!(matches!(config.validate(), Err(ValidationError::TierMismatch { .. })));

        let mut config = TopologyConfig::default();
        config.switches[2].name = "s2".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::DuplicateName(_))));
    }

    #[test]
    fn test_host_name_collision_with_switch() {
        let mut config = TopologyConfig::default();
        config.hosts.name_prefix = "s".to_string();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::DuplicateName(name)) if name == "s1"
        ));
    }

    #[test]
    fn test_controller_validation() {
        let mut config = TopologyConfig::default();
        config.controller.address = "127.0.0.1:0".parse().unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidController(_))));

        let mut config = TopologyConfig::default();
        config.controller.probe_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.controller.probe = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_subnets() {
        let mut config = TopologyConfig::default();
        config.subnets.clear();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));
    }
}
