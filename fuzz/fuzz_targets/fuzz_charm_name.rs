//! Fuzz target for charm URL name extraction.
//!
//! Extraction is pure string slicing and must never panic, whatever the URL.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc_common::extract_charm_name;

fuzz_target!(|data: &str| {
    let name = extract_charm_name(data);
    assert!(!name.contains('/'));
    assert!(!name.contains(':'));
    assert!(data.contains(name));
});
