//! Ubuntu series to OpenStack release table.

use crate::error::{Error, Result};

/// Ubuntu series paired with the OpenStack release it shipped, oldest first.
pub const UBUNTU_OPENSTACK_RELEASES: &[(&str, &str)] = &[
    ("oneiric", "diablo"),
    ("precise", "essex"),
    ("quantal", "folsom"),
    ("raring", "grizzly"),
    ("saucy", "havana"),
    ("trusty", "icehouse"),
    ("utopic", "juno"),
    ("vivid", "kilo"),
    ("wily", "liberty"),
    ("xenial", "mitaka"),
    ("yakkety", "newton"),
    ("zesty", "ocata"),
    ("artful", "pike"),
    ("bionic", "queens"),
    ("cosmic", "rocky"),
    ("disco", "stein"),
    ("eoan", "train"),
    ("focal", "ussuri"),
    ("groovy", "victoria"),
    ("hirsute", "wallaby"),
    ("impish", "xena"),
    ("jammy", "yoga"),
];

/// Position of an Ubuntu series in the release table.
///
/// Indices order series chronologically, so they can be compared directly.
pub fn get_ubuntu_release(series: &str) -> Result<usize> {
    UBUNTU_OPENSTACK_RELEASES
        .iter()
        .position(|(name, _)| *name == series)
        .ok_or_else(|| Error::UbuntuReleaseNotFound {
            release: series.to_string(),
        })
}

/// OpenStack release shipped with an Ubuntu series.
pub fn openstack_release_for_series(series: &str) -> Result<&'static str> {
    let index = get_ubuntu_release(series)?;
    Ok(UBUNTU_OPENSTACK_RELEASES[index].1)
}
