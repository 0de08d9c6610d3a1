//! Expected and observed process maps for unit validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How many PIDs a process is expected to have on a unit.
///
/// Deserializes untagged from an integer (`2`), a list of acceptable counts
/// (`[1, 2]`), or a boolean (`true`: at least one, `false`: none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PidExpectation {
    Running(bool),
    Exact(usize),
    OneOf(Vec<usize>),
}

impl PidExpectation {
    /// Whether an observed PID count satisfies this expectation.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            PidExpectation::Exact(n) => count == *n,
            PidExpectation::OneOf(counts) => counts.contains(&count),
            PidExpectation::Running(true) => count >= 1,
            PidExpectation::Running(false) => count == 0,
        }
    }
}

impl fmt::Display for PidExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PidExpectation::Exact(n) => write!(f, "{}", n),
            PidExpectation::OneOf(counts) => {
                let parts: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                write!(f, "one of [{}]", parts.join(", "))
            }
            PidExpectation::Running(true) => write!(f, "at least 1"),
            PidExpectation::Running(false) => write!(f, "0"),
        }
    }
}

impl From<usize> for PidExpectation {
    fn from(n: usize) -> Self {
        PidExpectation::Exact(n)
    }
}

impl From<Vec<usize>> for PidExpectation {
    fn from(counts: Vec<usize>) -> Self {
        PidExpectation::OneOf(counts)
    }
}

/// unit -> process name -> expected PID count.
pub type ExpectedProcessMap = BTreeMap<String, BTreeMap<String, PidExpectation>>;

/// unit -> process name -> PIDs reported by the unit.
pub type ActualProcessMap = BTreeMap<String, BTreeMap<String, Vec<String>>>;
