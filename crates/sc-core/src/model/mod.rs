//! Orchestration client seam.
//!
//! Everything that touches a live model goes through [`ModelClient`]. The
//! production implementation shells out to the `juju` binary ([`JujuCli`]);
//! tests use `test_utils::MockModel`.

pub mod juju;

pub use juju::{JujuCli, JujuCliConfig};

use sc_common::{
    ActionResult, ApplicationConfig, CommandResult, Error, ModelStatus, Result, UnitInfo,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Operations the helpers need from the orchestration tool, bound to one model.
pub trait ModelClient {
    /// Model this client talks to, `None` for the current model.
    fn model_name(&self) -> Option<&str>;

    /// Fetch a status snapshot of every application.
    fn get_status(&self) -> Result<ModelStatus>;

    /// Charm config options for an application.
    fn get_application_config(&self, application: &str) -> Result<ApplicationConfig>;

    fn set_application_config(
        &self,
        application: &str,
        settings: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Units of an application with their machines and addresses.
    /// Subordinate units report their principal's machine.
    fn get_units(&self, application: &str) -> Result<Vec<UnitInfo>> {
        let status = self.get_status()?;
        UnitInfo::for_application(&status, application)
            .ok_or_else(|| Error::Client(format!("application {} not found", application)))
    }

    /// Run a shell command on a unit. A non-zero exit is reported in the
    /// result, not as an error.
    fn run_on_unit(&self, unit: &str, command: &str) -> Result<CommandResult>;

    fn run_action(
        &self,
        unit: &str,
        action: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<ActionResult>;

    fn scp_to_unit(&self, unit: &str, source: &Path, destination: &str) -> Result<()>;

    /// Run `args` on a unit over SSH. Non-zero exit fails with `CommandFailed`.
    fn ssh(&self, unit: &str, args: &[&str]) -> Result<()>;

    fn prepare_series_upgrade(&self, machine: &str, to_series: &str) -> Result<()>;

    fn complete_series_upgrade(&self, machine: &str) -> Result<()>;

    fn set_series(&self, application: &str, series: &str) -> Result<()>;

    fn block_until_all_units_idle(&self) -> Result<()>;

    fn block_until_unit_wl_status(&self, unit: &str, status: &str) -> Result<()>;
}

/// Run a command on a unit and return its stdout, failing on non-zero exit.
pub fn remote_run(client: &dyn ModelClient, unit: &str, command: &str) -> Result<String> {
    let result = client.run_on_unit(unit, command)?;
    if !result.success() {
        return Err(Error::CommandFailed {
            unit: unit.to_string(),
            command: command.to_string(),
            code: result.exit_code(),
            stderr: result.stderr,
        });
    }
    Ok(result.stdout)
}
