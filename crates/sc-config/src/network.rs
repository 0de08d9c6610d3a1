//! Network topology configuration for the undercloud.
//!
//! Topologies live in `network.yaml`, keyed by topology name. Values from the
//! environment override the file so CI can point tests at its own networks.
//!
//! Environment precedence for each setting:
//! 1. lowercase setting name (`default_gateway`, `start_floating_ip`, ...)
//! 2. `TEST_`-prefixed variable (`TEST_GATEWAY`, `TEST_FIP_RANGE`, ...)
//! 3. legacy variable (`GATEWAY`, `FIP_RANGE`, ...)

use crate::resolve::{resolve_config_file, ENV_NETWORK_CONFIG, NETWORK_FILENAME};
use crate::yaml::{dict_to_yaml, get_yaml_config};
use sc_common::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings for one network topology.
pub type NetworkConfig = BTreeMap<String, serde_yaml::Value>;

/// (setting, preferred variable, legacy variable)
const ENV_SETTINGS: &[(&str, &str, &str)] = &[
    ("net_id", "TEST_NET_ID", "NET_ID"),
    ("external_dns", "TEST_NAME_SERVER", "NAME_SERVER"),
    ("default_gateway", "TEST_GATEWAY", "GATEWAY"),
    ("external_net_cidr", "TEST_CIDR_EXT", "CIDR_EXT"),
];

/// Settings that may be given directly under their own name.
const DIRECT_OVERRIDES: &[&str] = &[
    "default_gateway",
    "start_floating_ip",
    "end_floating_ip",
    "external_dns",
    "external_net_cidr",
];

/// Collect undercloud settings from the process environment.
pub fn get_undercloud_env_vars() -> BTreeMap<String, String> {
    undercloud_env_vars_from(|key| std::env::var(key).ok())
}

/// Collect undercloud settings using `lookup` to read variables.
///
/// Empty values are treated as unset.
pub fn undercloud_env_vars_from<F>(lookup: F) -> BTreeMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let mut vars = BTreeMap::new();

    for &(setting, preferred, legacy) in ENV_SETTINGS {
        if let Some(value) = get(preferred).or_else(|| get(legacy)) {
            vars.insert(setting.to_string(), value);
        }
    }

    if let Some(range) = get("TEST_FIP_RANGE").or_else(|| get("FIP_RANGE")) {
        if let Some((start, end)) = range.split_once(':') {
            vars.insert("start_floating_ip".to_string(), start.to_string());
            vars.insert("end_floating_ip".to_string(), end.to_string());
        }
    }

    for &setting in DIRECT_OVERRIDES {
        if let Some(value) = get(setting) {
            vars.insert(setting.to_string(), value);
        }
    }

    vars
}

/// Load a network topology, optionally overlaid with environment settings.
///
/// `path` must exist when given; otherwise `network.yaml` is resolved from
/// the usual config locations.
pub fn get_network_config(
    net_topology: &str,
    ignore_env_vars: bool,
    path: Option<&Path>,
) -> Result<NetworkConfig> {
    let path = match path {
        Some(p) if p.exists() => p.to_path_buf(),
        Some(p) => {
            return Err(Error::NetworkConfigNotFound {
                path: p.display().to_string(),
            })
        }
        None => resolve_config_file(None, ENV_NETWORK_CONFIG, NETWORK_FILENAME)
            .map(|resolved| resolved.path)
            .ok_or_else(|| Error::NetworkConfigNotFound {
                path: NETWORK_FILENAME.to_string(),
            })?,
    };

    let env = if ignore_env_vars {
        BTreeMap::new()
    } else {
        tracing::info!("Consuming network environment variables as overrides for the undercloud");
        get_undercloud_env_vars()
    };

    let config = load_topology(&path, net_topology, env)?;
    if let Ok(rendered) = dict_to_yaml(&config) {
        tracing::info!(topology = net_topology, "Network info:\n{}", rendered);
    }
    Ok(config)
}

/// Read `net_topology` from a YAML file and apply `overrides` on top.
pub fn load_topology(
    path: &Path,
    net_topology: &str,
    overrides: BTreeMap<String, String>,
) -> Result<NetworkConfig> {
    let mut topologies: BTreeMap<String, NetworkConfig> = get_yaml_config(path)?;
    let mut config = topologies
        .remove(net_topology)
        .ok_or_else(|| Error::TopologyNotFound {
            topology: net_topology.to_string(),
            path: path.display().to_string(),
        })?;

    for (key, value) in overrides {
        config.insert(key, serde_yaml::Value::String(value));
    }
    Ok(config)
}
