//! Small checks run across an application's units.

use crate::model::{remote_run, ModelClient};
use sc_common::{Error, Result, UnitInfo};
use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, info};

/// Connect timeout used by [`is_port_open`].
pub const PORT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Installed version of `package`, which must agree across all units.
///
/// Reads the third column of the first `dpkg -l | grep <package>` line.
pub fn get_pkg_version(client: &dyn ModelClient, application: &str, package: &str) -> Result<String> {
    let command = format!("dpkg -l | grep {}", package);
    let mut versions: Vec<String> = Vec::new();
    for unit in client.get_units(application)? {
        let output = remote_run(client, &unit.entity_id, &command)?;
        let version = output
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(2))
            .unwrap_or_default()
            .to_string();
        debug!(unit = %unit.entity_id, package, version = %version, "package version");
        versions.push(version);
    }

    let mut distinct = versions.clone();
    distinct.sort();
    distinct.dedup();
    match distinct.len() {
        1 => Ok(distinct.remove(0)),
        0 => Err(Error::Client(format!("application {} has no units", application))),
        _ => Err(Error::PackageVersionMismatch {
            package: package.to_string(),
            versions,
        }),
    }
}

/// Hostname of each unit, keyed by unit name.
pub fn get_unit_hostnames(
    client: &dyn ModelClient,
    units: &[UnitInfo],
) -> Result<BTreeMap<String, String>> {
    let mut hostnames = BTreeMap::new();
    for unit in units {
        let output = remote_run(client, &unit.entity_id, "hostname")?;
        hostnames.insert(unit.entity_id.clone(), output.trim().to_string());
    }
    Ok(hostnames)
}

/// Whether a TCP connection to `address:port` succeeds within the timeout.
pub fn is_port_open(port: u16, address: &str) -> bool {
    let addrs: Vec<SocketAddr> = match (address, port).to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(err) => {
            debug!(address, port, error = %err, "address did not resolve");
            return false;
        }
    };
    addrs
        .iter()
        .any(|addr| TcpStream::connect_timeout(addr, PORT_CHECK_TIMEOUT).is_ok())
}

/// Check a port on every unit's public address.
///
/// Fails with `PortCheckFailed` when any unit contradicts `expect_success`.
pub fn port_knock_units(units: &[UnitInfo], port: u16, expect_success: bool) -> Result<()> {
    for unit in units {
        let address = unit.public_address.as_deref().ok_or_else(|| {
            Error::PortCheckFailed(format!("{} has no public address", unit.entity_id))
        })?;
        let open = is_port_open(port, address);
        info!(unit = %unit.entity_id, address, port, open, "port knock");
        if open != expect_success {
            return Err(Error::PortCheckFailed(format!(
                "{} ({}) port {} open={} expected={}",
                unit.entity_id, address, port, open, expect_success
            )));
        }
    }
    Ok(())
}

/// Run each command on each unit; the first non-zero exit fails.
pub fn check_commands_on_units(
    client: &dyn ModelClient,
    commands: &[&str],
    units: &[UnitInfo],
) -> Result<()> {
    for unit in units {
        for command in commands {
            remote_run(client, &unit.entity_id, command)?;
        }
    }
    Ok(())
}
