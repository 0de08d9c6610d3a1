//! Fuzz target for expected process map parsing.
//!
//! Maps arrive as JSON or YAML with integer, list, or boolean expectations.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc_common::ExpectedProcessMap;

fuzz_target!(|input: (&str, u8)| {
    let (text, count) = input;
    let parsed = serde_json::from_str::<ExpectedProcessMap>(text)
        .ok()
        .or_else(|| serde_yaml::from_str::<ExpectedProcessMap>(text).ok());
    if let Some(map) = parsed {
        for processes in map.values() {
            for expectation in processes.values() {
                let _ = expectation.accepts(count as usize);
                let _ = expectation.to_string();
            }
        }
    }
});
