//! Typed records for the orchestration client's status and result payloads.
//!
//! The client speaks loosely typed JSON. These records are the boundary:
//! everything past this module works with named fields instead of string keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Snapshot of a model's deployed applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    #[serde(default)]
    pub applications: BTreeMap<String, ApplicationStatus>,
}

impl ModelStatus {
    /// Look up a single application, if deployed.
    pub fn application(&self, name: &str) -> Option<&ApplicationStatus> {
        self.applications.get(name)
    }

    /// Every unit in the model, subordinates included, as
    /// `(name, agent status, workload status)`.
    pub fn unit_states(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.applications
            .values()
            .flat_map(|app| app.units.iter())
            .flat_map(|(name, unit)| {
                std::iter::once((name.as_str(), unit.agent(), unit.workload())).chain(
                    unit.subordinates
                        .iter()
                        .map(|(sub, status)| (sub.as_str(), status.agent(), status.workload())),
                )
            })
    }
}

fn current_of(info: &Option<StatusInfo>) -> &str {
    info.as_ref().map(|s| s.current.as_str()).unwrap_or("")
}

/// Status entry for one deployed application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationStatus {
    /// Charm URL, e.g. `cs:bionic/keystone-317`. May be empty.
    #[serde(default)]
    pub charm: String,

    /// Principal applications this one is attached to.
    #[serde(default)]
    pub subordinate_to: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,

    #[serde(default)]
    pub units: BTreeMap<String, UnitStatus>,
}

impl ApplicationStatus {
    /// Whether this application is deployed as a subordinate.
    pub fn is_subordinate(&self) -> bool {
        !self.subordinate_to.is_empty()
    }

    /// Name of the leader unit, if one is flagged.
    pub fn leader(&self) -> Option<&str> {
        self.units
            .iter()
            .find(|(_, unit)| unit.leader)
            .map(|(name, _)| name.as_str())
    }
}

/// Per-unit status within an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnitStatus {
    #[serde(default)]
    pub leader: bool,

    #[serde(default)]
    pub machine: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_status: Option<StatusInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub juju_status: Option<StatusInfo>,

    #[serde(default)]
    pub subordinates: BTreeMap<String, SubordinateStatus>,
}

impl UnitStatus {
    /// Current workload status string, or "" if unreported.
    pub fn workload(&self) -> &str {
        current_of(&self.workload_status)
    }

    /// Current agent status string, or "" if unreported.
    pub fn agent(&self) -> &str {
        current_of(&self.juju_status)
    }
}

/// A subordinate unit riding on a principal. It shares the principal's machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubordinateStatus {
    #[serde(default)]
    pub charm: String,
    #[serde(default)]
    pub leader: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_status: Option<StatusInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub juju_status: Option<StatusInfo>,
}

impl SubordinateStatus {
    pub fn workload(&self) -> &str {
        current_of(&self.workload_status)
    }

    pub fn agent(&self) -> &str {
        current_of(&self.juju_status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    #[serde(default)]
    pub current: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Flattened view of one unit, as returned by `get_units`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub entity_id: String,
    pub application: String,
    pub machine: String,
    pub public_address: Option<String>,
}

impl UnitInfo {
    /// Build unit records for every principal unit of `application`.
    pub fn from_status(application: &str, status: &ApplicationStatus) -> Vec<UnitInfo> {
        status
            .units
            .iter()
            .map(|(name, unit)| UnitInfo {
                entity_id: name.clone(),
                application: application.to_string(),
                machine: unit.machine.clone(),
                public_address: unit.public_address.clone(),
            })
            .collect()
    }

    /// Units of `application` in a model snapshot, or `None` if it is not
    /// deployed.
    ///
    /// Subordinate applications have no units of their own in the status
    /// output; theirs are collected from the principals named in
    /// `subordinate-to`, taking the principal unit's machine and address.
    pub fn for_application(model: &ModelStatus, application: &str) -> Option<Vec<UnitInfo>> {
        let status = model.application(application)?;
        let mut units = Self::from_status(application, status);

        for principal in &status.subordinate_to {
            let Some(principal) = model.application(principal) else {
                continue;
            };
            for unit in principal.units.values() {
                units.extend(
                    unit.subordinates
                        .keys()
                        .filter(|sub| unit_application(sub) == application)
                        .map(|sub| UnitInfo {
                            entity_id: sub.clone(),
                            application: application.to_string(),
                            machine: unit.machine.clone(),
                            public_address: unit.public_address.clone(),
                        }),
                );
            }
        }
        units.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        units.dedup_by(|a, b| a.entity_id == b.entity_id);
        Some(units)
    }
}

/// Application name portion of a unit name (`keystone/0` -> `keystone`).
pub fn unit_application(unit: &str) -> &str {
    unit.split('/').next().unwrap_or(unit)
}

/// Result of running a shell command on a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(
        rename = "Code",
        alias = "ReturnCode",
        alias = "return-code",
        default = "default_code",
        deserialize_with = "deserialize_code"
    )]
    pub code: String,
    #[serde(rename = "Stdout", alias = "stdout", default)]
    pub stdout: String,
    #[serde(rename = "Stderr", alias = "stderr", default)]
    pub stderr: String,
}

/// A result without a code is a success; only a reported code can fail.
fn default_code() -> String {
    "0".to_string()
}

/// Accept the result code as either a JSON string or number.
fn deserialize_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => default_code(),
        other => other.to_string(),
    })
}

impl CommandResult {
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        CommandResult {
            code: code.to_string(),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Numeric exit code. An empty code is success (0); unparsable codes
    /// count as failure (1).
    pub fn exit_code(&self) -> i32 {
        match self.code.trim() {
            "" => 0,
            code => code.parse().unwrap_or(1),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code() == 0
    }
}

/// Outcome of a charm action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default)]
    pub results: BTreeMap<String, serde_json::Value>,
}

impl ActionResult {
    pub fn completed() -> Self {
        ActionResult {
            status: "completed".to_string(),
            ..Default::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

/// Charm configuration options for an application, keyed by option name.
pub type ApplicationConfig = BTreeMap<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_JSON: &str = r#"{
        "applications": {
            "app": {
                "can-upgrade-to": "",
                "charm": "local:trusty/app-136",
                "subordinate-to": [],
                "units": {
                    "app/0": {
                        "leader": true,
                        "machine": "0",
                        "subordinates": {
                            "app-hacluster/0": {"charm": "local:trusty/hacluster-0", "leader": true}
                        }
                    },
                    "app/1": {
                        "machine": "1",
                        "workload-status": {"current": "active", "message": "Unit is ready"},
                        "subordinates": {
                            "app-hacluster/1": {
                                "charm": "local:trusty/hacluster-0",
                                "workload-status": {"current": "blocked"},
                                "juju-status": {"current": "executing"}
                            }
                        }
                    }
                }
            },
            "app-hacluster": {
                "charm": "local:trusty/hacluster-0",
                "subordinate-to": ["app"]
            }
        }
    }"#;

    #[test]
    fn test_status_parses_kebab_case_fields() {
        let status: ModelStatus = serde_json::from_str(STATUS_JSON).unwrap();
        let app = status.application("app").unwrap();

        assert_eq!(app.charm, "local:trusty/app-136");
        assert!(!app.is_subordinate());
        assert_eq!(app.leader(), Some("app/0"));
        assert_eq!(app.units["app/1"].workload(), "active");
        assert_eq!(app.units["app/0"].subordinates.len(), 1);
        assert!(status.application("app-hacluster").unwrap().is_subordinate());
    }

    #[test]
    fn test_unit_info_from_status() {
        let status: ModelStatus = serde_json::from_str(STATUS_JSON).unwrap();
        let units = UnitInfo::from_status("app", status.application("app").unwrap());

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].entity_id, "app/0");
        assert_eq!(units[1].machine, "1");
    }

    #[test]
    fn test_subordinate_units_follow_their_principal() {
        let status: ModelStatus = serde_json::from_str(STATUS_JSON).unwrap();

        let units = UnitInfo::for_application(&status, "app-hacluster").unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["app-hacluster/0", "app-hacluster/1"]);
        assert_eq!(units[1].machine, "1");
        assert!(units.iter().all(|u| u.application == "app-hacluster"));

        assert_eq!(UnitInfo::for_application(&status, "app").unwrap().len(), 2);
        assert!(UnitInfo::for_application(&status, "missing").is_none());
    }

    #[test]
    fn test_unit_states_include_subordinates() {
        let status: ModelStatus = serde_json::from_str(STATUS_JSON).unwrap();
        let states: Vec<_> = status.unit_states().collect();

        assert_eq!(states.len(), 4);
        assert!(states.contains(&("app-hacluster/1", "executing", "blocked")));
        assert!(states.contains(&("app/1", "", "active")));
    }

    #[test]
    fn test_command_result_code_forms() {
        let as_string: CommandResult =
            serde_json::from_str(r#"{"Code": "0", "Stdout": "1 2", "Stderr": ""}"#).unwrap();
        assert!(as_string.success());

        let as_number: CommandResult =
            serde_json::from_str(r#"{"Code": 2, "Stdout": ""}"#).unwrap();
        assert_eq!(as_number.exit_code(), 2);

        let missing: CommandResult = serde_json::from_str(r#"{"Stdout": "x"}"#).unwrap();
        assert!(missing.success());
        assert_eq!(missing.stdout, "x");

        let null_code: CommandResult =
            serde_json::from_str(r#"{"Code": null, "Stdout": ""}"#).unwrap();
        assert_eq!(null_code.exit_code(), 0);

        let garbage = CommandResult {
            code: "n/a".into(),
            ..Default::default()
        };
        assert_eq!(garbage.exit_code(), 1);
        assert!(CommandResult::default().success());
    }

    #[test]
    fn test_unit_application() {
        assert_eq!(unit_application("keystone/0"), "keystone");
        assert_eq!(unit_application("keystone"), "keystone");
    }
}
