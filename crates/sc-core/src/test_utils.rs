//! Test utilities for sc-core.
//!
//! This module provides:
//! - `MockModel`, a scripted [`ModelClient`] that records every call
//! - Fixture loading helpers
//! - Common assertions

use crate::model::ModelClient;
use sc_common::{
    ActionResult, ApplicationConfig, CommandResult, Error, ModelStatus, Result,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

// ============================================================================
// Macros
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(_) => {}
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => panic!("{}: got Ok({:?})", $msg, val),
            Err(_) => {}
        }
    };
}

// ============================================================================
// Fixtures
// ============================================================================

/// Fixture directory relative to crate root.
pub const FIXTURES_DIR: &str = "tests/fixtures";

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join(FIXTURES_DIR)
        .join(name)
}

/// Load a fixture file and parse as JSON.
pub fn load_fixture_json<T: serde::de::DeserializeOwned>(name: &str) -> std::result::Result<T, String> {
    let content = std::fs::read_to_string(fixture_path(name))
        .map_err(|e| format!("Failed to read fixture {}: {}", name, e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse fixture {}: {}", name, e))
}

// ============================================================================
// MockModel
// ============================================================================

/// One recorded call against [`MockModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    GetStatus,
    GetConfig(String),
    SetConfig {
        application: String,
        settings: BTreeMap<String, String>,
    },
    Run {
        unit: String,
        command: String,
    },
    Action {
        unit: String,
        action: String,
        params: BTreeMap<String, String>,
    },
    Scp {
        unit: String,
        source: PathBuf,
        destination: String,
    },
    Ssh {
        unit: String,
        args: Vec<String>,
    },
    PrepareSeries {
        machine: String,
        to_series: String,
    },
    CompleteSeries {
        machine: String,
    },
    SetSeries {
        application: String,
        series: String,
    },
    WaitIdle,
    WaitWorkload {
        unit: String,
        status: String,
    },
}

/// Scripted in-memory model.
///
/// Unscripted commands succeed with empty output; unscripted actions
/// complete; unknown applications have an empty config.
#[derive(Debug, Default)]
pub struct MockModel {
    model_name: Option<String>,
    status: ModelStatus,
    configs: BTreeMap<String, ApplicationConfig>,
    unit_results: BTreeMap<(String, String), CommandResult>,
    command_results: BTreeMap<String, CommandResult>,
    action_results: BTreeMap<String, ActionResult>,
    failing_ssh: BTreeSet<String>,
    calls: RefCell<Vec<MockCall>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_name(mut self, name: &str) -> Self {
        self.model_name = Some(name.to_string());
        self
    }

    pub fn with_status(mut self, status: ModelStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_config<I, K>(mut self, application: &str, options: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        let config = self.configs.entry(application.to_string()).or_default();
        for (key, value) in options {
            config.insert(key.into(), value);
        }
        self
    }

    /// Script the result of `command` on one unit.
    pub fn with_run_result(mut self, unit: &str, command: &str, result: CommandResult) -> Self {
        self.unit_results
            .insert((unit.to_string(), command.to_string()), result);
        self
    }

    /// Script the result of `command` on any unit.
    pub fn with_command_result(mut self, command: &str, result: CommandResult) -> Self {
        self.command_results.insert(command.to_string(), result);
        self
    }

    pub fn with_action_result(mut self, action: &str, result: ActionResult) -> Self {
        self.action_results.insert(action.to_string(), result);
        self
    }

    /// Make every `ssh` to `unit` exit non-zero.
    pub fn with_failing_ssh(mut self, unit: &str) -> Self {
        self.failing_ssh.insert(unit.to_string());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Applications whose config was read, in call order.
    pub fn config_lookups(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                MockCall::GetConfig(app) => Some(app.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(unit, command)` pairs passed to `run_on_unit`, in call order.
    pub fn commands_run(&self) -> Vec<(String, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                MockCall::Run { unit, command } => Some((unit.clone(), command.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl ModelClient for MockModel {
    fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    fn get_status(&self) -> Result<ModelStatus> {
        self.record(MockCall::GetStatus);
        Ok(self.status.clone())
    }

    fn get_application_config(&self, application: &str) -> Result<ApplicationConfig> {
        self.record(MockCall::GetConfig(application.to_string()));
        Ok(self.configs.get(application).cloned().unwrap_or_default())
    }

    fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.record(MockCall::SetConfig {
            application: application.to_string(),
            settings: settings.clone(),
        });
        Ok(())
    }

    fn run_on_unit(&self, unit: &str, command: &str) -> Result<CommandResult> {
        self.record(MockCall::Run {
            unit: unit.to_string(),
            command: command.to_string(),
        });
        let result = self
            .unit_results
            .get(&(unit.to_string(), command.to_string()))
            .or_else(|| self.command_results.get(command))
            .cloned()
            .unwrap_or_else(|| CommandResult::new(0, "", ""));
        Ok(result)
    }

    fn run_action(
        &self,
        unit: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ActionResult> {
        self.record(MockCall::Action {
            unit: unit.to_string(),
            action: action.to_string(),
            params: params.clone(),
        });
        Ok(self
            .action_results
            .get(action)
            .cloned()
            .unwrap_or_else(ActionResult::completed))
    }

    fn scp_to_unit(&self, unit: &str, source: &Path, destination: &str) -> Result<()> {
        self.record(MockCall::Scp {
            unit: unit.to_string(),
            source: source.to_path_buf(),
            destination: destination.to_string(),
        });
        Ok(())
    }

    fn ssh(&self, unit: &str, args: &[&str]) -> Result<()> {
        self.record(MockCall::Ssh {
            unit: unit.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        if self.failing_ssh.contains(unit) {
            return Err(Error::CommandFailed {
                unit: unit.to_string(),
                command: args.join(" "),
                code: 255,
                stderr: "Connection to host closed".to_string(),
            });
        }
        Ok(())
    }

    fn prepare_series_upgrade(&self, machine: &str, to_series: &str) -> Result<()> {
        self.record(MockCall::PrepareSeries {
            machine: machine.to_string(),
            to_series: to_series.to_string(),
        });
        Ok(())
    }

    fn complete_series_upgrade(&self, machine: &str) -> Result<()> {
        self.record(MockCall::CompleteSeries {
            machine: machine.to_string(),
        });
        Ok(())
    }

    fn set_series(&self, application: &str, series: &str) -> Result<()> {
        self.record(MockCall::SetSeries {
            application: application.to_string(),
            series: series.to_string(),
        });
        Ok(())
    }

    fn block_until_all_units_idle(&self) -> Result<()> {
        self.record(MockCall::WaitIdle);
        Ok(())
    }

    fn block_until_unit_wl_status(&self, unit: &str, status: &str) -> Result<()> {
        self.record(MockCall::WaitWorkload {
            unit: unit.to_string(),
            status: status.to_string(),
        });
        Ok(())
    }
}
