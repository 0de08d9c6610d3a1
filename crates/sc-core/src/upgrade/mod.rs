//! Upgrade-group planning.
//!
//! Applications are filtered through an exclusion chain and then partitioned
//! into ordered phases ([`SERVICE_GROUPS`] plus [`SWEEP_UP`]). Each
//! [`UpgradeMode`] pre-installs its own default chain; callers append extras.

pub mod filter;
pub mod groups;

pub use filter::{
    builtin_filter, CharmSubstringFilter, ExcludeListFilter, ExtraFilters, FilterChain,
    NonOpenstackFilter, SubordinateFilter, UpgradeFilter, UPGRADE_EXCLUDE_LIST,
};
pub use groups::{
    build_service_groups, get_upgrade_candidates, plan_groups, ServiceGroup, SERVICE_GROUPS,
    SWEEP_UP,
};

use crate::model::ModelClient;
use sc_common::{Error, Result};
use sc_config::UpgradeConfig;
use std::fmt;
use std::str::FromStr;

/// Which kind of upgrade a plan is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeMode {
    /// Payload upgrade: skips subordinates, the exclude list, and non-OpenStack charms.
    Openstack,
    /// Series upgrade: skips subordinates.
    Series,
    /// Charm upgrade: no default exclusions.
    Charm,
}

impl UpgradeMode {
    /// The filter chain pre-installed for this mode.
    pub fn default_filters(self) -> FilterChain {
        match self {
            UpgradeMode::Openstack => FilterChain::new()
                .with(SubordinateFilter)
                .with(ExcludeListFilter)
                .with(NonOpenstackFilter),
            UpgradeMode::Series => FilterChain::new().with(SubordinateFilter),
            UpgradeMode::Charm => FilterChain::new(),
        }
    }

    /// Default chain followed by `extra`.
    pub fn filters(self, extra: ExtraFilters) -> Result<FilterChain> {
        let mut chain = self.default_filters();
        chain.extend(extra)?;
        Ok(chain)
    }
}

impl fmt::Display for UpgradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeMode::Openstack => write!(f, "openstack"),
            UpgradeMode::Series => write!(f, "series"),
            UpgradeMode::Charm => write!(f, "charm"),
        }
    }
}

impl FromStr for UpgradeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openstack" | "payload" => Ok(UpgradeMode::Openstack),
            "series" => Ok(UpgradeMode::Series),
            "charm" => Ok(UpgradeMode::Charm),
            _ => Err(Error::InvalidArgument(format!("unknown upgrade mode: {}", s))),
        }
    }
}

/// Plan upgrade phases for `mode`, fetching the model status once.
pub fn get_groups_for_mode(
    client: &dyn ModelClient,
    mode: UpgradeMode,
    extra: ExtraFilters,
) -> Result<Vec<ServiceGroup>> {
    let filters = mode.filters(extra)?;
    tracing::info!(%mode, filters = ?filters.names(), "planning upgrade groups");
    let candidates = get_upgrade_candidates(client, &filters)?;
    Ok(build_service_groups(&candidates))
}

/// Plan phases for `mode` with the extra filters named in `config`.
pub fn get_groups_with_config(
    client: &dyn ModelClient,
    mode: UpgradeMode,
    config: &UpgradeConfig,
) -> Result<Vec<ServiceGroup>> {
    get_groups_for_mode(client, mode, ExtraFilters::named(&config.extra_filters))
}

/// Phases for an OpenStack payload upgrade.
pub fn get_upgrade_groups(
    client: &dyn ModelClient,
    extra: ExtraFilters,
) -> Result<Vec<ServiceGroup>> {
    get_groups_for_mode(client, UpgradeMode::Openstack, extra)
}

/// Phases for a series upgrade.
pub fn get_series_upgrade_groups(
    client: &dyn ModelClient,
    extra: ExtraFilters,
) -> Result<Vec<ServiceGroup>> {
    get_groups_for_mode(client, UpgradeMode::Series, extra)
}

/// Phases for a charm upgrade.
pub fn get_charm_upgrade_groups(
    client: &dyn ModelClient,
    extra: ExtraFilters,
) -> Result<Vec<ServiceGroup>> {
    get_groups_for_mode(client, UpgradeMode::Charm, extra)
}
