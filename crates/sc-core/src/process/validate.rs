//! Comparing expected and observed process maps.

use sc_common::{ActualProcessMap, Error, ExpectedProcessMap, Result};
use tracing::debug;

/// Check that `actual` matches `expected` unit by unit and process by process.
///
/// Checks run in a fixed order and the first failure is returned: unit
/// count, unit presence, per-unit process count, process names, then PID
/// counts.
pub fn validate_unit_process_ids(
    expected: &ExpectedProcessMap,
    actual: &ActualProcessMap,
) -> Result<bool> {
    debug!(?expected, ?actual, "validating unit process ids");

    if expected.len() != actual.len() {
        return Err(Error::UnitCountMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    for (unit, processes) in expected {
        let observed = actual.get(unit).ok_or_else(|| Error::UnitNotFound {
            unit: unit.clone(),
        })?;

        if processes.len() != observed.len() {
            return Err(Error::ProcessNameCountMismatch {
                unit: unit.clone(),
                expected: processes.len(),
                actual: observed.len(),
            });
        }

        for (process, expectation) in processes {
            let pids = observed
                .get(process)
                .ok_or_else(|| Error::ProcessNameMismatch {
                    unit: unit.clone(),
                    process: process.clone(),
                })?;

            if !expectation.accepts(pids.len()) {
                return Err(Error::PidCountMismatch {
                    unit: unit.clone(),
                    process: process.clone(),
                    expected: expectation.to_string(),
                    actual: pids.len(),
                });
            }
            debug!(unit = %unit, process = %process, count = pids.len(), "pid count ok");
        }
    }

    Ok(true)
}
