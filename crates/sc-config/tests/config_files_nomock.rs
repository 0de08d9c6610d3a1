//! No-mock configuration file tests.
//!
//! Covers:
//! - Resolution order (explicit > env path > config dir)
//! - Network topology loading with environment overrides
//! - Upgrade settings loaded through the environment

use sc_common::Error;
use sc_config::resolve::{
    resolve_config_file, ConfigSource, ENV_CONFIG_DIR, ENV_NETWORK_CONFIG, ENV_UPGRADE_CONFIG,
    NETWORK_FILENAME,
};
use sc_config::{get_network_config, UpgradeConfig};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &[
    ENV_CONFIG_DIR,
    ENV_NETWORK_CONFIG,
    ENV_UPGRADE_CONFIG,
    "TEST_NET_ID",
    "NET_ID",
    "TEST_GATEWAY",
    "GATEWAY",
    "TEST_FIP_RANGE",
    "FIP_RANGE",
    "TEST_NAME_SERVER",
    "NAME_SERVER",
    "TEST_CIDR_EXT",
    "CIDR_EXT",
    "default_gateway",
    "start_floating_ip",
    "end_floating_ip",
    "external_dns",
    "external_net_cidr",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Save and clear every key this suite touches.
    fn clean() -> Self {
        let saved = ENV_KEYS
            .iter()
            .map(|key| (key.to_string(), env::var(key).ok()))
            .collect();
        for key in ENV_KEYS {
            env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let _env = EnvGuard::clean();
    f()
}

const NETWORK_YAML: &str = "\
openstack:
  net_id: file-net
  default_gateway: 10.5.0.1
  external_net_cidr: 10.5.0.0/16
  start_floating_ip: 10.5.150.0
  end_floating_ip: 10.5.200.254
  external_dns: 10.5.0.2
  network_type: gre
";

fn write_network(dir: &Path) -> std::path::PathBuf {
    let path = dir.join(NETWORK_FILENAME);
    fs::write(&path, NETWORK_YAML).expect("write network.yaml");
    path
}

#[test]
fn explicit_path_beats_environment() {
    with_env_lock(|| {
        let explicit_dir = TempDir::new().unwrap();
        let env_dir = TempDir::new().unwrap();
        let explicit = write_network(explicit_dir.path());
        let from_env = write_network(env_dir.path());

        env::set_var(ENV_NETWORK_CONFIG, from_env.display().to_string());

        let resolved =
            resolve_config_file(Some(&explicit), ENV_NETWORK_CONFIG, NETWORK_FILENAME).unwrap();
        assert_eq!(resolved.source, ConfigSource::Explicit);
        assert_eq!(resolved.path, explicit);

        let resolved = resolve_config_file(None, ENV_NETWORK_CONFIG, NETWORK_FILENAME).unwrap();
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path, from_env);
    });
}

#[test]
fn config_dir_used_when_no_direct_path() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let path = write_network(dir.path());
        env::set_var(ENV_CONFIG_DIR, dir.path().display().to_string());

        let resolved = resolve_config_file(None, ENV_NETWORK_CONFIG, NETWORK_FILENAME).unwrap();
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path, path);
    });
}

#[test]
fn network_config_with_env_overrides() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let path = write_network(dir.path());

        env::set_var("GATEWAY", "10.0.0.1");
        env::set_var("TEST_GATEWAY", "10.9.0.1");
        env::set_var("TEST_FIP_RANGE", "10.9.200.0:10.9.200.254");
        env::set_var("external_net_cidr", "10.100.0.0/16");

        let config = get_network_config("openstack", false, Some(&path)).unwrap();
        let get = |key: &str| config.get(key).and_then(|v| v.as_str()).map(str::to_string);

        assert_eq!(get("default_gateway").as_deref(), Some("10.9.0.1"));
        assert_eq!(get("start_floating_ip").as_deref(), Some("10.9.200.0"));
        assert_eq!(get("end_floating_ip").as_deref(), Some("10.9.200.254"));
        assert_eq!(get("external_net_cidr").as_deref(), Some("10.100.0.0/16"));
        assert_eq!(get("net_id").as_deref(), Some("file-net"));
        assert_eq!(get("network_type").as_deref(), Some("gre"));

        let untouched = get_network_config("openstack", true, Some(&path)).unwrap();
        assert_eq!(
            untouched.get("default_gateway").and_then(|v| v.as_str()),
            Some("10.5.0.1")
        );
    });
}

#[test]
fn network_config_errors() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            get_network_config("openstack", true, Some(&missing)),
            Err(Error::NetworkConfigNotFound { .. })
        ));

        let path = write_network(dir.path());
        assert!(matches!(
            get_network_config("vlan", true, Some(&path)),
            Err(Error::TopologyNotFound { ref topology, .. }) if topology == "vlan"
        ));
    });
}

#[test]
fn upgrade_config_from_env_path() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series.yaml");
        fs::write(
            &path,
            "series:\n  from_series: bionic\n  to_series: focal\n  pause_non_leader_primary: false\npoll:\n  timeout_secs: 60\n  interval_secs: 2\n",
        )
        .unwrap();
        env::set_var(ENV_UPGRADE_CONFIG, path.display().to_string());

        let config = UpgradeConfig::load(None).unwrap();
        assert_eq!(config.series.to_series, "focal");
        assert!(!config.series.pause_non_leader_primary);
        assert!(config.series.pause_non_leader_subordinate);
        assert_eq!(config.poll.timeout_secs, 60);
        assert_eq!(config.poll.interval_secs, 2);
    });
}
