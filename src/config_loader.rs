use crate::config::TopologyConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse a topology description from a YAML file
pub fn load_config(config_path: &Path) -> Result<TopologyConfig> {
    info!("Loading topology from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open topology file '{}'", config_path.display()))?;

    let config: TopologyConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse topology file '{}'", config_path.display()))?;

    config.validate()?;

    info!(
        "Loaded topology: {} switches, {} hosts over {} subnets",
        config.switches.len(),
        config.hosts.count,
        config.subnets.len()
    );
    Ok(config)
}

/// CLI flags that can override settings from the YAML file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub skip_controller_probe: bool,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut TopologyConfig, overrides: &CliOverrides) -> Result<()> {
    if overrides.skip_controller_probe {
        info!("Controller probe disabled from the command line");
        config.controller.probe = false;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

/// Write the effective configuration back out as YAML
pub fn save_config(config: &TopologyConfig, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).wrap_err("Failed to serialize topology")?;
    std::fs::write(path, yaml)
        .wrap_err_with(|| format!("Failed to write topology file '{}'", path.display()))?;
    info!("Wrote topology description to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_topology() {
        let yaml = r#"
controller:
  name: c0
  address: "127.0.0.1:6653"
subnets: ["192.168.0.0/24"]
hosts:
  count: 2
  per_subnet: 2
switches:
  - name: core
    tier: core
  - name: agg
    tier: aggregation
    uplink: { to: core, bandwidth: 10, delay: 1ms }
  - name: edge
    tier: access
    uplink: { to: agg }
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.controller.name, "c0");
        assert_eq!(config.hosts.count, 2);
        assert_eq!(config.switches.len(), 3);
    }

    #[test]
    fn test_invalid_topology_is_rejected() {
        let yaml = r#"
hosts:
  count: 9
  per_access_switch: 3
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("capacity of 8"), "{}", err);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/topology.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to open topology file"));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = TopologyConfig::default();
        assert!(config.controller.probe);

        apply_overrides(&mut config, &CliOverrides { skip_controller_probe: true }).unwrap();
        assert!(!config.controller.probe);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_file = NamedTempFile::new().unwrap();
        save_config(&TopologyConfig::default(), temp_file.path()).unwrap();

        let reloaded = load_config(temp_file.path()).unwrap();
        assert_eq!(reloaded, TopologyConfig::default());
    }
}
