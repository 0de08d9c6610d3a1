//! Remote PID discovery via `pidof`.

use crate::model::ModelClient;
use sc_common::{ActualProcessMap, Error, ExpectedProcessMap, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Build the `pidof` command for a process.
///
/// With `expect_success == false` the exit status is inverted so that an
/// absent process counts as success.
pub fn pidof_command(process: &str, expect_success: bool) -> String {
    let mut cmd = format!("pidof -x \"{}\"", process);
    if !expect_success {
        cmd.push_str(" || exit 0 && exit 1");
    }
    cmd
}

/// PIDs of `process` on `unit`, as reported by `pidof`.
pub fn get_process_id_list(
    client: &dyn ModelClient,
    unit: &str,
    process: &str,
    expect_success: bool,
) -> Result<Vec<String>> {
    let command = pidof_command(process, expect_success);
    let result = client.run_on_unit(unit, &command)?;
    if !result.success() {
        return Err(Error::ProcessIdsFailed {
            unit: unit.to_string(),
            command,
            code: result.exit_code(),
            stderr: result.stderr,
        });
    }
    let pids: Vec<String> = result.stdout.split_whitespace().map(str::to_string).collect();
    debug!(unit, process, pids = ?pids, "pidof");
    Ok(pids)
}

/// Collect PIDs for every unit/process named in `unit_processes`.
///
/// Only the keys are used; expected counts are checked separately by
/// [`validate_unit_process_ids`](super::validate_unit_process_ids).
pub fn get_unit_process_ids(
    client: &dyn ModelClient,
    unit_processes: &ExpectedProcessMap,
    expect_success: bool,
) -> Result<ActualProcessMap> {
    let mut actual = BTreeMap::new();
    for (unit, processes) in unit_processes {
        let mut pids = BTreeMap::new();
        for process in processes.keys() {
            pids.insert(
                process.clone(),
                get_process_id_list(client, unit, process, expect_success)?,
            );
        }
        actual.insert(unit.clone(), pids);
    }
    Ok(actual)
}
