//! stackcheck core library
//!
//! Helpers for OpenStack deployment tests driven through Juju:
//! - Upgrade-group planning with exclusion filter chains
//! - Remote process discovery and PID validation
//! - Rolling series upgrades of application units
//! - Unit checks (package versions, hostnames, ports, commands)
//! - Logging setup for test drivers
//!
//! All model access goes through the [`ModelClient`] trait.

pub mod logging;
pub mod model;
pub mod process;
pub mod series;
pub mod units;
pub mod upgrade;

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use model::{remote_run, JujuCli, JujuCliConfig, ModelClient};
pub use process::{get_process_id_list, get_unit_process_ids, validate_unit_process_ids};
pub use series::{series_upgrade, series_upgrade_application};
pub use upgrade::{
    get_charm_upgrade_groups, get_series_upgrade_groups, get_upgrade_groups, plan_groups,
    ExtraFilters, FilterChain, ServiceGroup, UpgradeFilter, UpgradeMode,
};
