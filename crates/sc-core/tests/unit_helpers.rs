//! Integration tests for per-unit helpers.

use sc_common::{CommandResult, Error, ModelStatus};
use sc_core::test_utils::{load_fixture_json, MockModel};
use sc_core::units::{check_commands_on_units, get_pkg_version, get_unit_hostnames};
use sc_core::{assert_err, assert_ok, remote_run, ModelClient};

const PKG: &str = "os-thingy";
const VERSION: &str = "2:27.0.0-0ubuntu1~cloud0";

fn fixture_model() -> MockModel {
    let status: ModelStatus = load_fixture_json("status.json").expect("load status fixture");
    MockModel::new().with_status(status)
}

fn dpkg_line(version: &str) -> CommandResult {
    CommandResult::new(0, format!("ii {} {} all OpenStack thingy\n", PKG, version), "")
}

#[test]
fn pkg_version_matches_across_units() {
    let model = fixture_model().with_command_result("dpkg -l | grep os-thingy", dpkg_line(VERSION));
    assert_eq!(assert_ok!(get_pkg_version(&model, "app", PKG)), VERSION);
    assert_eq!(model.commands_run().len(), 3);
}

#[test]
fn pkg_version_mismatch() {
    let model = fixture_model()
        .with_command_result("dpkg -l | grep os-thingy", dpkg_line(VERSION))
        .with_run_result("app/2", "dpkg -l | grep os-thingy", dpkg_line("DIFFERENT"));

    match get_pkg_version(&model, "app", PKG) {
        Err(Error::PackageVersionMismatch { package, versions }) => {
            assert_eq!(package, PKG);
            assert_eq!(versions, vec![VERSION, VERSION, "DIFFERENT"]);
        }
        other => panic!("expected PackageVersionMismatch, got {:?}", other),
    }
}

#[test]
fn hostnames_are_trimmed() {
    let model = fixture_model()
        .with_run_result("app/0", "hostname", CommandResult::new(0, "juju-0\n", ""))
        .with_run_result("app/1", "hostname", CommandResult::new(0, "juju-1\n", ""));
    let units: Vec<_> = assert_ok!(model.get_units("app"))
        .into_iter()
        .filter(|u| u.entity_id != "app/2")
        .collect();

    let hostnames = assert_ok!(get_unit_hostnames(&model, &units));
    assert_eq!(hostnames["app/0"], "juju-0");
    assert_eq!(hostnames["app/1"], "juju-1");
}

#[test]
fn check_commands_stops_at_first_failure() {
    let model = fixture_model().with_run_result(
        "app/1",
        "systemctl is-active apache2",
        CommandResult::new(3, "inactive", ""),
    );
    let units = assert_ok!(model.get_units("app"));

    let err = check_commands_on_units(&model, &["true", "systemctl is-active apache2"], &units)
        .unwrap_err();
    assert!(matches!(err, Error::CommandFailed { ref unit, code: 3, .. } if unit == "app/1"));
    // app/0 ran both commands, app/1 failed on the second, app/2 never ran.
    assert_eq!(model.commands_run().len(), 4);
}

#[test]
fn remote_run_returns_stdout_or_command_failed() {
    let model = MockModel::new()
        .with_command_result("uname -r", CommandResult::new(0, "5.4.0\n", ""))
        .with_command_result("false", CommandResult::new(1, "", "nope"));

    assert_eq!(assert_ok!(remote_run(&model, "app/0", "uname -r")), "5.4.0\n");
    assert_err!(remote_run(&model, "app/0", "false"));
}

#[test]
fn get_units_reads_status() {
    let model = fixture_model();
    let units = assert_ok!(model.get_units("app"));
    let ids: Vec<&str> = units.iter().map(|u| u.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["app/0", "app/1", "app/2"]);
    assert_eq!(units[0].public_address.as_deref(), Some("10.5.0.10"));
    assert_eq!(units[2].machine, "2");

    assert!(matches!(model.get_units("missing"), Err(Error::Client(_))));
}

#[test]
fn subordinate_units_come_from_principals() {
    let model = fixture_model();
    let units = assert_ok!(model.get_units("app-hacluster"));

    let ids: Vec<&str> = units.iter().map(|u| u.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["app-hacluster/0", "app-hacluster/1", "app-hacluster/2"]);
    let machines: Vec<&str> = units.iter().map(|u| u.machine.as_str()).collect();
    assert_eq!(machines, vec!["0", "1", "2"]);
    assert_eq!(units[1].public_address.as_deref(), Some("10.5.0.11"));

    let cinder_ceph = assert_ok!(model.get_units("cinder-ceph"));
    assert_eq!(cinder_ceph.len(), 2);
}

#[test]
fn pkg_version_on_subordinate_application() {
    let model = fixture_model().with_command_result("dpkg -l | grep os-thingy", dpkg_line(VERSION));
    assert_eq!(assert_ok!(get_pkg_version(&model, "app-hacluster", PKG)), VERSION);

    let run_on: Vec<String> = model
        .commands_run()
        .into_iter()
        .map(|(unit, _)| unit)
        .collect();
    assert_eq!(run_on, vec!["app-hacluster/0", "app-hacluster/1", "app-hacluster/2"]);
}
