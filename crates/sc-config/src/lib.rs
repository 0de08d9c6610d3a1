//! stackcheck configuration loading.
//!
//! This crate provides:
//! - Config file resolution (explicit → env → cwd → XDG → /etc)
//! - YAML helpers
//! - Network topology config with environment overrides
//! - Series upgrade and polling settings

pub mod network;
pub mod resolve;
pub mod upgrade;
pub mod yaml;

pub use network::{get_network_config, get_undercloud_env_vars, NetworkConfig};
pub use resolve::{resolve_config_file, ConfigSource, ResolvedPath};
pub use upgrade::{PollSettings, SeriesUpgradeSettings, UpgradeConfig};
pub use yaml::{dict_to_yaml, get_yaml_config};
