//! Partitioning applications into ordered upgrade phases.

use super::filter::FilterChain;
use crate::model::ModelClient;
use sc_common::{extract_charm_name, ApplicationStatus, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Name of the catch-all phase for applications matching no named group.
pub const SWEEP_UP: &str = "sweep_up";

/// Named phases in upgrade order, each with the charms it covers.
pub const SERVICE_GROUPS: &[(&str, &[&str])] = &[
    ("Database Services", &["percona-cluster", "mysql-innodb-cluster"]),
    ("Stateful Services", &["rabbitmq-server", "ceph-mon"]),
    ("Core Identity", &["keystone"]),
    (
        "Control Plane",
        &[
            "aodh",
            "barbican",
            "ceilometer",
            "ceph-fs",
            "ceph-radosgw",
            "cinder",
            "designate",
            "designate-bind",
            "glance",
            "gnocchi",
            "heat",
            "manila",
            "manila-generic",
            "neutron-api",
            "neutron-gateway",
            "placement",
            "nova-cloud-controller",
            "openstack-dashboard",
        ],
    ),
    (
        "Data Plane",
        &["nova-compute", "ceph-osd", "swift-proxy", "swift-storage"],
    ),
];

/// One upgrade phase and its applications, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceGroup {
    pub name: String,
    pub members: Vec<String>,
}

impl ServiceGroup {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Fetch the model status once and keep the applications no filter excludes.
pub fn get_upgrade_candidates(
    client: &dyn ModelClient,
    filters: &FilterChain,
) -> Result<BTreeMap<String, ApplicationStatus>> {
    let status = client.get_status()?;
    apply_filters(client, status.applications, filters)
}

/// Group already-fetched applications after applying `filters`.
pub fn plan_groups(
    client: &dyn ModelClient,
    applications: BTreeMap<String, ApplicationStatus>,
    filters: &FilterChain,
) -> Result<Vec<ServiceGroup>> {
    let candidates = apply_filters(client, applications, filters)?;
    Ok(build_service_groups(&candidates))
}

fn apply_filters(
    client: &dyn ModelClient,
    applications: BTreeMap<String, ApplicationStatus>,
    filters: &FilterChain,
) -> Result<BTreeMap<String, ApplicationStatus>> {
    let mut candidates = BTreeMap::new();
    for (app, status) in applications {
        if filters.excludes(&app, &status, client)? {
            continue;
        }
        candidates.insert(app, status);
    }
    debug!(
        candidates = candidates.len(),
        filters = ?filters.names(),
        "selected upgrade candidates"
    );
    Ok(candidates)
}

/// Place every application into exactly one phase.
///
/// Named phases come first in [`SERVICE_GROUPS`] order, followed by
/// [`SWEEP_UP`]. Empty phases are kept so callers see a stable shape.
pub fn build_service_groups(applications: &BTreeMap<String, ApplicationStatus>) -> Vec<ServiceGroup> {
    let mut placed: BTreeSet<String> = BTreeSet::new();
    let mut groups = Vec::with_capacity(SERVICE_GROUPS.len() + 1);

    for (phase, charms) in SERVICE_GROUPS {
        let mut members: Vec<String> = applications
            .iter()
            .filter(|(app, status)| {
                !placed.contains(app.as_str()) && charms.contains(&extract_charm_name(&status.charm))
            })
            .map(|(app, _)| app.clone())
            .collect();
        members.sort();
        placed.extend(members.iter().cloned());
        groups.push(ServiceGroup {
            name: (*phase).to_string(),
            members,
        });
    }

    let mut sweep_up: Vec<String> = applications
        .keys()
        .filter(|app| !placed.contains(app.as_str()))
        .cloned()
        .collect();
    sweep_up.sort();
    groups.push(ServiceGroup {
        name: SWEEP_UP.to_string(),
        members: sweep_up,
    });

    for group in groups.iter().filter(|g| !g.is_empty()) {
        info!(phase = %group.name, members = ?group.members, "upgrade phase");
    }
    groups
}
