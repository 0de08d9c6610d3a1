//! Fuzz target for status and command-result JSON parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc_common::{CommandResult, ModelStatus};

fuzz_target!(|data: &[u8]| {
    if let Ok(status) = serde_json::from_slice::<ModelStatus>(data) {
        for (name, app) in &status.applications {
            let _ = sc_common::extract_charm_name(&app.charm);
            let _ = app.leader();
            let _ = status.unit_states().count();
            let _ = sc_common::UnitInfo::from_status(name, app);
            let _ = sc_common::UnitInfo::for_application(&status, name);
        }
    }
    if let Ok(result) = serde_json::from_slice::<CommandResult>(data) {
        let _ = result.exit_code();
    }
});
