//! Rolling Ubuntu series upgrades of deployed units.
//!
//! Each step is issued through [`ModelClient`] and awaited before the next.
//! There is no resumption: a failed step aborts the run, and callers restart
//! with the `completed_machines` list returned by earlier runs.

use crate::model::ModelClient;
use sc_common::{unit_application, Error, Result};
use sc_config::SeriesUpgradeSettings;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Subordinates that are never paused before a series upgrade.
pub const SUBORDINATE_PAUSE_RESUME_BLACKLIST: &[&str] = &["cinder-ceph"];

/// Pocket written to the origin option after upgrade.
pub const DEFAULT_POCKET: &str = "distro";

const UNATTENDED_UPGRADES_CONF: &str = "/etc/apt/apt.conf.d/50unattended-upgrades";
const DPKG_CONFDEF_OPTION: &str = r#"DPkg::options { "--force-confdef"; };"#;

/// Hook run on a unit after its series upgrade completes.
pub type PostUpgradeHook<'a> = &'a dyn Fn(&dyn ModelClient, &str) -> Result<()>;

/// Run `sudo apt update` followed by a non-interactive dist-upgrade.
pub fn dist_upgrade(client: &dyn ModelClient, unit: &str) -> Result<()> {
    info!(unit, "dist-upgrade");
    run_logged(client, unit, "sudo apt update")?;
    run_logged(
        client,
        unit,
        "sudo DEBIAN_FRONTEND=noninteractive apt --assume-yes \
         -o \"Dpkg::Options::=--force-confdef\" \
         -o \"Dpkg::Options::=--force-confold\" dist-upgrade",
    )
}

/// Run `do-release-upgrade` over SSH. A non-zero exit is logged and ignored.
pub fn do_release_upgrade(client: &dyn ModelClient, unit: &str) -> Result<()> {
    info!(unit, "do-release-upgrade");
    ignore_command_failure(
        unit,
        client.ssh(
            unit,
            &[
                "sudo",
                "DEBIAN_FRONTEND=noninteractive",
                "do-release-upgrade",
                "-f",
                "DistUpgradeViewNonInteractive",
            ],
        ),
    )
}

/// Run `sudo <command>` over SSH. A non-zero exit is logged and ignored.
pub fn run_via_ssh(client: &dyn ModelClient, unit: &str, command: &str) -> Result<()> {
    let command = format!("sudo {}", command);
    ignore_command_failure(unit, client.ssh(unit, &[command.as_str()]))
}

/// Reboot a unit. The dropped connection is logged and ignored.
pub fn reboot(client: &dyn ModelClient, unit: &str) -> Result<()> {
    info!(unit, "rebooting");
    ignore_command_failure(unit, client.ssh(unit, &["sudo", "reboot", "&&", "exit"]))
}

/// Make unattended upgrades keep existing config files.
pub fn set_dpkg_non_interactive_on_unit(client: &dyn ModelClient, unit: &str) -> Result<()> {
    let command = format!(
        "grep '{opt}' {conf} || echo '{opt}' >> {conf}",
        opt = DPKG_CONFDEF_OPTION,
        conf = UNATTENDED_UPGRADES_CONF
    );
    run_logged(client, unit, &command)
}

/// Set an application's origin option (`openstack-origin` or `source`).
pub fn set_origin(
    client: &dyn ModelClient,
    application: &str,
    origin: &str,
    pocket: &str,
) -> Result<()> {
    info!(application, origin, pocket, "setting origin");
    let mut settings = BTreeMap::new();
    settings.insert(origin.to_string(), pocket.to_string());
    client.set_application_config(application, &settings)
}

/// Copy helper files, run the workaround script, then `do-release-upgrade`.
pub fn wrap_do_release_upgrade(
    client: &dyn ModelClient,
    unit: &str,
    settings: &SeriesUpgradeSettings,
) -> Result<()> {
    for file in &settings.files {
        let destination = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("not a file path: {}", file.display()))
            })?;
        client.scp_to_unit(unit, file, &destination)?;
    }
    if let Some(script) = &settings.workaround_script {
        run_via_ssh(client, unit, script)?;
    }
    do_release_upgrade(client, unit)
}

/// Upgrade the series of one unit's machine.
pub fn series_upgrade(
    client: &dyn ModelClient,
    unit: &str,
    machine: &str,
    settings: &SeriesUpgradeSettings,
    post_upgrade: &[PostUpgradeHook<'_>],
) -> Result<()> {
    let application = unit_application(unit);
    info!(
        unit,
        machine,
        from = %settings.from_series,
        to = %settings.to_series,
        "series upgrade"
    );

    set_dpkg_non_interactive_on_unit(client, unit)?;
    dist_upgrade(client, unit)?;
    client.block_until_all_units_idle()?;

    client.prepare_series_upgrade(machine, &settings.to_series)?;
    client.block_until_unit_wl_status(unit, "blocked")?;
    client.block_until_all_units_idle()?;

    wrap_do_release_upgrade(client, unit, settings)?;
    reboot(client, unit)?;
    client.block_until_unit_wl_status(unit, "blocked")?;
    client.block_until_all_units_idle()?;

    if let Some(origin) = &settings.origin {
        set_origin(client, application, origin, DEFAULT_POCKET)?;
        client.block_until_all_units_idle()?;
    }

    client.complete_series_upgrade(machine)?;
    client.block_until_all_units_idle()?;

    for hook in post_upgrade {
        hook(client, unit)?;
    }
    client.block_until_unit_wl_status(unit, "active")?;
    client.block_until_all_units_idle()?;

    client.set_series(application, &settings.to_series)?;
    info!(unit, machine, "series upgrade complete");
    Ok(())
}

/// Upgrade every machine of an application, leader first.
///
/// Non-leader subordinates and/or principals are paused beforehand per
/// `settings`. Machines already in `completed_machines` are skipped; the
/// returned list includes every machine upgraded so far.
pub fn series_upgrade_application(
    client: &dyn ModelClient,
    application: &str,
    settings: &SeriesUpgradeSettings,
    mut completed_machines: Vec<String>,
    post_upgrade: &[PostUpgradeHook<'_>],
) -> Result<Vec<String>> {
    let status = client.get_status()?;
    let app = status
        .application(application)
        .ok_or_else(|| Error::Client(format!("application {} not found", application)))?;
    let leader = app
        .leader()
        .ok_or_else(|| Error::Client(format!("application {} has no leader unit", application)))?;

    let non_leaders: Vec<(&String, &sc_common::UnitStatus)> =
        app.units.iter().filter(|(name, _)| name.as_str() != leader).collect();

    for (unit, unit_status) in &non_leaders {
        if settings.pause_non_leader_subordinate {
            for subordinate in unit_status.subordinates.keys() {
                if SUBORDINATE_PAUSE_RESUME_BLACKLIST.contains(&unit_application(subordinate)) {
                    info!(unit = %subordinate, "skipping pause of blacklisted subordinate");
                    continue;
                }
                pause_unit(client, subordinate)?;
            }
        }
        if settings.pause_non_leader_primary {
            pause_unit(client, unit)?;
        }
    }

    let leader_machine = &app.units[leader].machine;
    let order = std::iter::once((leader, leader_machine)).chain(
        non_leaders
            .iter()
            .map(|(unit, unit_status)| (unit.as_str(), &unit_status.machine)),
    );

    for (unit, machine) in order {
        if completed_machines.contains(machine) {
            info!(unit, machine = %machine, "machine already upgraded, skipping");
            continue;
        }
        series_upgrade(client, unit, machine, settings, post_upgrade)?;
        completed_machines.push(machine.clone());
    }

    Ok(completed_machines)
}

fn pause_unit(client: &dyn ModelClient, unit: &str) -> Result<()> {
    info!(unit, "pausing");
    let result = client.run_action(unit, "pause", &BTreeMap::new())?;
    if result.is_failed() {
        return Err(Error::ActionFailed {
            unit: unit.to_string(),
            action: "pause".to_string(),
            message: result.message,
        });
    }
    Ok(())
}

fn run_logged(client: &dyn ModelClient, unit: &str, command: &str) -> Result<()> {
    let result = client.run_on_unit(unit, command)?;
    if !result.success() {
        warn!(
            unit,
            command,
            code = result.exit_code(),
            stderr = %result.stderr,
            "command returned non-zero"
        );
    }
    Ok(())
}

fn ignore_command_failure(unit: &str, result: Result<()>) -> Result<()> {
    match result {
        Err(Error::CommandFailed { command, code, .. }) => {
            warn!(unit, command = %command, code, "ssh command failed, continuing");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockCall, MockModel};

    #[test]
    fn test_dist_upgrade_commands() {
        let model = MockModel::new();
        dist_upgrade(&model, "app/2").unwrap();
        let commands: Vec<String> = model.commands_run().into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            commands,
            vec![
                "sudo apt update".to_string(),
                "sudo DEBIAN_FRONTEND=noninteractive apt --assume-yes \
                 -o \"Dpkg::Options::=--force-confdef\" \
                 -o \"Dpkg::Options::=--force-confold\" dist-upgrade"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_set_dpkg_non_interactive() {
        let model = MockModel::new();
        set_dpkg_non_interactive_on_unit(&model, "app/1").unwrap();
        assert_eq!(
            model.commands_run(),
            vec![(
                "app/1".to_string(),
                "grep 'DPkg::options { \"--force-confdef\"; };' \
                 /etc/apt/apt.conf.d/50unattended-upgrades || \
                 echo 'DPkg::options { \"--force-confdef\"; };' >> \
                 /etc/apt/apt.conf.d/50unattended-upgrades"
                    .to_string()
            )]
        );
    }

    #[test]
    fn test_ssh_failures_are_ignored() {
        let model = MockModel::new().with_failing_ssh("app/2");
        reboot(&model, "app/2").unwrap();
        run_via_ssh(&model, "app/2", "hostname").unwrap();
        do_release_upgrade(&model, "app/2").unwrap();
        assert_eq!(model.calls().len(), 3);
    }

    #[test]
    fn test_run_via_ssh_prefixes_sudo() {
        let model = MockModel::new();
        run_via_ssh(&model, "app/2", "hostname").unwrap();
        assert_eq!(
            model.calls(),
            vec![MockCall::Ssh {
                unit: "app/2".to_string(),
                args: vec!["sudo hostname".to_string()],
            }]
        );
    }

    #[test]
    fn test_set_origin() {
        let model = MockModel::new();
        set_origin(&model, "application", "source", "cloud:fake-cloud").unwrap();
        let mut settings = BTreeMap::new();
        settings.insert("source".to_string(), "cloud:fake-cloud".to_string());
        assert_eq!(
            model.calls(),
            vec![MockCall::SetConfig {
                application: "application".to_string(),
                settings,
            }]
        );
    }
}
