//! `juju` CLI backed model client.
//!
//! Each operation runs one `juju` subcommand, scoped with `-m <model>` when a
//! model is configured, and parses its `--format=json` output into the typed
//! records from `sc_common::status`.

use super::ModelClient;
use sc_common::{ActionResult, ApplicationConfig, CommandResult, Error, ModelStatus, Result};
use sc_config::PollSettings;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Configuration for the `juju` CLI client.
#[derive(Debug, Clone)]
pub struct JujuCliConfig {
    /// Binary name/path (default: "juju").
    pub binary: String,
    /// Model to scope every command to; `None` uses the current model.
    pub model: Option<String>,
    /// Bounds for the `block_until_*` waits.
    pub poll: PollSettings,
}

impl Default for JujuCliConfig {
    fn default() -> Self {
        Self {
            binary: "juju".to_string(),
            model: None,
            poll: PollSettings::default(),
        }
    }
}

/// Model client that drives the `juju` binary.
#[derive(Debug, Clone, Default)]
pub struct JujuCli {
    config: JujuCliConfig,
}

impl JujuCli {
    pub fn new(config: JujuCliConfig) -> Self {
        Self { config }
    }

    /// Client for a named model with default settings.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self::new(JujuCliConfig {
            model: Some(model.into()),
            ..JujuCliConfig::default()
        })
    }

    fn run(&self, subcommand: &str, args: &[String]) -> Result<Output> {
        let argv = build_juju_args(subcommand, self.config.model.as_deref(), args);
        trace!(binary = %self.config.binary, args = ?argv, "running juju");

        Command::new(&self.config.binary)
            .args(&argv)
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    Error::Client(format!("{} binary not found: {}", self.config.binary, e))
                } else {
                    Error::Client(format!("{} {} failed: {}", self.config.binary, subcommand, e))
                }
            })
    }

    /// Run a subcommand and return stdout, failing on non-zero exit.
    fn run_checked(&self, subcommand: &str, args: &[String]) -> Result<String> {
        let output = self.run(subcommand, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            return Err(Error::Client(format!(
                "juju {} exited with code {}: {}",
                subcommand,
                code,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Poll status until `done` holds or the poll timeout expires.
    fn wait_for<F>(&self, what: &str, done: F) -> Result<()>
    where
        F: Fn(&ModelStatus) -> bool,
    {
        let poll = self.config.poll;
        let start = Instant::now();
        loop {
            let status = self.get_status()?;
            if done(&status) {
                debug!(what, elapsed_ms = start.elapsed().as_millis() as u64, "wait satisfied");
                return Ok(());
            }
            if start.elapsed() >= poll.timeout() {
                return Err(Error::Timeout {
                    what: what.to_string(),
                    seconds: poll.timeout_secs,
                });
            }
            std::thread::sleep(poll.interval());
        }
    }
}

impl ModelClient for JujuCli {
    fn model_name(&self) -> Option<&str> {
        self.config.model.as_deref()
    }

    fn get_status(&self) -> Result<ModelStatus> {
        let stdout = self.run_checked("status", &["--format=json".to_string()])?;
        Ok(serde_json::from_str(&stdout)?)
    }

    fn get_application_config(&self, application: &str) -> Result<ApplicationConfig> {
        let stdout = self.run_checked(
            "config",
            &[application.to_string(), "--format=json".to_string()],
        )?;
        parse_config_output(&stdout)
    }

    fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut args = vec![application.to_string()];
        args.extend(settings.iter().map(|(k, v)| format!("{}={}", k, v)));
        self.run_checked("config", &args).map(|_| ())
    }

    fn run_on_unit(&self, unit: &str, command: &str) -> Result<CommandResult> {
        let stdout = self.run_checked(
            "run",
            &[
                "--format=json".to_string(),
                "--unit".to_string(),
                unit.to_string(),
                "--".to_string(),
                command.to_string(),
            ],
        )?;
        parse_run_output(&stdout)
    }

    fn run_action(
        &self,
        unit: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ActionResult> {
        let mut args = vec![
            "--wait".to_string(),
            "--format=json".to_string(),
            unit.to_string(),
            action.to_string(),
        ];
        args.extend(params.iter().map(|(k, v)| format!("{}={}", k, v)));
        let stdout = self.run_checked("run-action", &args)?;
        parse_action_output(&stdout)
    }

    fn scp_to_unit(&self, unit: &str, source: &Path, destination: &str) -> Result<()> {
        self.run_checked(
            "scp",
            &[
                source.display().to_string(),
                format!("{}:{}", unit, destination),
            ],
        )
        .map(|_| ())
    }

    fn ssh(&self, unit: &str, args: &[&str]) -> Result<()> {
        let mut argv = vec![unit.to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        let output = self.run("ssh", &argv)?;
        if output.status.success() {
            return Ok(());
        }
        Err(Error::CommandFailed {
            unit: unit.to_string(),
            command: args.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn prepare_series_upgrade(&self, machine: &str, to_series: &str) -> Result<()> {
        info!(machine, to_series, "preparing series upgrade");
        self.run_checked(
            "upgrade-series",
            &[
                machine.to_string(),
                "prepare".to_string(),
                to_series.to_string(),
                "--yes".to_string(),
            ],
        )
        .map(|_| ())
    }

    fn complete_series_upgrade(&self, machine: &str) -> Result<()> {
        info!(machine, "completing series upgrade");
        self.run_checked(
            "upgrade-series",
            &[machine.to_string(), "complete".to_string()],
        )
        .map(|_| ())
    }

    fn set_series(&self, application: &str, series: &str) -> Result<()> {
        self.run_checked("set-series", &[application.to_string(), series.to_string()])
            .map(|_| ())
    }

    fn block_until_all_units_idle(&self) -> Result<()> {
        self.wait_for("all units idle", all_units_idle)
    }

    fn block_until_unit_wl_status(&self, unit: &str, status: &str) -> Result<()> {
        let what = format!("{} workload status {}", unit, status);
        self.wait_for(&what, |snapshot| {
            unit_workload(snapshot, unit) == Some(status)
        })
    }
}

/// Build the argument vector for a `juju` subcommand.
fn build_juju_args(subcommand: &str, model: Option<&str>, args: &[String]) -> Vec<String> {
    let mut argv = vec![subcommand.to_string()];
    if let Some(model) = model {
        argv.push("-m".to_string());
        argv.push(model.to_string());
    }
    argv.extend(args.iter().cloned());
    argv
}

/// Workload status of a principal or subordinate unit, if present.
fn unit_workload<'a>(status: &'a ModelStatus, unit: &str) -> Option<&'a str> {
    status
        .unit_states()
        .find(|(name, _, _)| *name == unit)
        .map(|(_, _, workload)| workload)
}

/// Whether every unit's agent, subordinates included, reports idle.
fn all_units_idle(status: &ModelStatus) -> bool {
    status.unit_states().all(|(_, agent, _)| agent == "idle")
}

/// Parse `juju config --format=json` into option -> value.
///
/// Options without an explicit value report their default.
fn parse_config_output(raw: &str) -> Result<ApplicationConfig> {
    let value: Value = serde_json::from_str(raw)?;
    let settings = value
        .get("settings")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Client("config output has no settings".to_string()))?;

    Ok(settings
        .iter()
        .map(|(name, option)| {
            let v = option
                .get("value")
                .or_else(|| option.get("default"))
                .cloned()
                .unwrap_or(Value::Null);
            (name.clone(), v)
        })
        .collect())
}

fn first_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k))
}

/// Parse `juju run --format=json` output for a single unit.
///
/// Accepts a list of per-unit entries or a map keyed by unit, with the fields
/// either at the top level or under `results`. A missing return code means
/// success.
fn parse_run_output(raw: &str) -> Result<CommandResult> {
    let value: Value = serde_json::from_str(raw)?;
    let entry = match &value {
        Value::Array(items) => items.first(),
        Value::Object(map) if map.contains_key("Stdout") || map.contains_key("results") => {
            Some(&value)
        }
        Value::Object(map) => map.values().next(),
        _ => None,
    }
    .ok_or_else(|| Error::Client("run output has no unit results".to_string()))?;
    let fields = entry.get("results").unwrap_or(entry);

    let code = match first_field(fields, &["Code", "ReturnCode", "return-code"]) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let text = |keys: &[&str]| {
        first_field(fields, keys)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    Ok(CommandResult {
        code,
        stdout: text(&["Stdout", "stdout"]),
        stderr: text(&["Stderr", "stderr"]),
    })
}

/// Parse `juju run-action --wait --format=json` output.
fn parse_action_output(raw: &str) -> Result<ActionResult> {
    let value: Value = serde_json::from_str(raw)?;
    let entry = value
        .as_object()
        .and_then(|map| map.values().next())
        .ok_or_else(|| Error::Client("action output is empty".to_string()))?;
    Ok(serde_json::from_value(entry.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = JujuCliConfig::default();
        assert_eq!(config.binary, "juju");
        assert!(config.model.is_none());
        assert_eq!(config.poll, PollSettings::default());
    }

    #[test]
    fn build_args_without_model() {
        let args = build_juju_args("status", None, &["--format=json".to_string()]);
        assert_eq!(args, vec!["status", "--format=json"]);
    }

    #[test]
    fn build_args_with_model() {
        let args = build_juju_args("ssh", Some("test-model"), &["app/2".to_string()]);
        assert_eq!(args, vec!["ssh", "-m", "test-model", "app/2"]);
    }

    #[test]
    fn model_name_from_config() {
        let client = JujuCli::for_model("openstack");
        assert_eq!(client.model_name(), Some("openstack"));
    }

    #[test]
    fn parse_run_output_list_form() {
        let raw = r#"[{"MachineId": "0", "Stdout": "1 2\n", "UnitId": "ceph-osd/0"}]"#;
        let result = parse_run_output(raw).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "1 2\n");
    }

    #[test]
    fn parse_run_output_failure_code() {
        let raw = r#"[{"ReturnCode": 1, "Stdout": "", "Stderr": "boom", "UnitId": "u/0"}]"#;
        let result = parse_run_output(raw).unwrap();
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.stderr, "boom");
    }

    #[test]
    fn parse_run_output_nested_results() {
        let raw = r#"{"u/0": {"id": "1", "results": {"return-code": 0, "stdout": "host1"}}}"#;
        let result = parse_run_output(raw).unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "host1");
    }

    #[test]
    fn parse_run_output_empty_list() {
        assert!(parse_run_output("[]").is_err());
    }

    #[test]
    fn parse_config_output_values_and_defaults() {
        let raw = r#"{
            "application": "keystone",
            "settings": {
                "openstack-origin": {"value": "cloud:bionic-train", "default": "distro"},
                "debug": {"default": false}
            }
        }"#;
        let config = parse_config_output(raw).unwrap();
        assert_eq!(config["openstack-origin"], Value::String("cloud:bionic-train".into()));
        assert_eq!(config["debug"], Value::Bool(false));
    }

    #[test]
    fn parse_action_output_status() {
        let raw = r#"{"unit-app-1": {"id": "7", "status": "completed", "results": {"Code": "0"}}}"#;
        let result = parse_action_output(raw).unwrap();
        assert_eq!(result.status, "completed");
        assert!(!result.is_failed());
    }

    #[test]
    fn all_units_idle_checks_agent_status() {
        let busy: ModelStatus = serde_json::from_str(
            r#"{"applications": {"a": {"charm": "cs:a-1", "units": {
                "a/0": {"machine": "0", "juju-status": {"current": "idle"}},
                "a/1": {"machine": "1", "juju-status": {"current": "executing"}}
            }}}}"#,
        )
        .unwrap();
        assert!(!all_units_idle(&busy));

        let mut idle = busy.clone();
        if let Some(app) = idle.applications.get_mut("a") {
            for unit in app.units.values_mut() {
                unit.juju_status = Some(sc_common::StatusInfo {
                    current: "idle".into(),
                    message: String::new(),
                });
            }
        }
        assert!(all_units_idle(&idle));
        assert_eq!(unit_workload(&idle, "a/1"), Some(""));
        assert_eq!(unit_workload(&idle, "b/0"), None);
    }

    const HACLUSTER_BUSY: &str = r#"{"applications": {
        "keystone": {"charm": "cs:keystone-309", "units": {
            "keystone/0": {
                "machine": "0",
                "juju-status": {"current": "idle"},
                "workload-status": {"current": "active"},
                "subordinates": {
                    "keystone-hacluster/0": {
                        "charm": "cs:hacluster-66",
                        "juju-status": {"current": "executing"},
                        "workload-status": {"current": "waiting"}
                    }
                }
            }
        }},
        "keystone-hacluster": {"charm": "cs:hacluster-66", "subordinate-to": ["keystone"]}
    }}"#;

    #[test]
    fn busy_subordinate_keeps_model_busy() {
        let status: ModelStatus = serde_json::from_str(HACLUSTER_BUSY).unwrap();
        assert!(!all_units_idle(&status));
        assert_eq!(unit_workload(&status, "keystone-hacluster/0"), Some("waiting"));
        assert_eq!(unit_workload(&status, "keystone/0"), Some("active"));
    }

    /// Client whose `juju` is a shell script printing `status_json`.
    #[cfg(unix)]
    fn scripted_client(dir: &Path, status_json: &str, poll: PollSettings) -> JujuCli {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("juju");
        std::fs::write(&script, format!("#!/bin/sh\ncat <<'EOF'\n{}\nEOF\n", status_json))
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        JujuCli::new(JujuCliConfig {
            binary: script.display().to_string(),
            model: Some("test".to_string()),
            poll,
        })
    }

    #[cfg(unix)]
    #[test]
    fn wait_times_out_while_subordinate_executes() {
        let dir = tempfile::tempdir().unwrap();
        let poll = PollSettings {
            timeout_secs: 0,
            interval_secs: 0,
        };
        let client = scripted_client(dir.path(), HACLUSTER_BUSY, poll);

        let err = client.block_until_all_units_idle().unwrap_err();
        assert!(matches!(err, Error::Timeout { seconds: 0, .. }), "{err:?}");

        let err = client
            .block_until_unit_wl_status("keystone-hacluster/0", "active")
            .unwrap_err();
        assert!(
            matches!(err, Error::Timeout { ref what, .. } if what.contains("keystone-hacluster/0"))
        );
        client
            .block_until_unit_wl_status("keystone-hacluster/0", "waiting")
            .unwrap();
    }
}
