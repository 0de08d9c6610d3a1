//! Error types for stackcheck.
//!
//! Each failure the validators and unit helpers can report is one variant of
//! [`Error`], carrying a numeric code that never changes once assigned, an
//! [`ErrorCategory`], and a short headline.
//!
//! [`StructuredError`] renders any of them as JSON:
//! ```json
//! {
//!   "code": 34,
//!   "category": "validation",
//!   "message": "PID count mismatch on ceph-osd/0 (ceph-osd): expected 2, actual 1",
//!   "context": { "unit": "ceph-osd/0", "process": "ceph-osd", "actual": 1 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Shorthand used by every fallible stackcheck function.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse grouping of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration files, arguments, and filter chains.
    Config,
    /// Unit/process/PID validation failures.
    Validation,
    /// Remote commands and actions on units.
    Remote,
    /// Orchestration client and transport failures.
    Client,
    /// Local files and (de)serialization.
    Io,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Remote => "remote",
            ErrorCategory::Client => "client",
            ErrorCategory::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure stackcheck reports.
#[derive(Error, Debug)]
pub enum Error {
    // 10-19
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("network topology file {path} not found")]
    NetworkConfigNotFound { path: String },

    #[error("network topology '{topology}' not defined in {path}")]
    TopologyNotFound { topology: String, path: String },

    // 30-39
    #[error("unit count mismatch: expected {expected}, actual {actual}")]
    UnitCountMismatch { expected: usize, actual: usize },

    #[error("unit not found: {unit}")]
    UnitNotFound { unit: String },

    #[error("process name count mismatch on {unit}: expected {expected}, actual {actual}")]
    ProcessNameCountMismatch {
        unit: String,
        expected: usize,
        actual: usize,
    },

    #[error("process name mismatch on {unit}: {process} not reported")]
    ProcessNameMismatch { unit: String, process: String },

    #[error("PID count mismatch on {unit} ({process}): expected {expected}, actual {actual}")]
    PidCountMismatch {
        unit: String,
        process: String,
        expected: String,
        actual: usize,
    },

    #[error("Ubuntu release not found: {release}")]
    UbuntuReleaseNotFound { release: String },

    #[error("package {package} version differs across units: {}", .versions.join(", "))]
    PackageVersionMismatch {
        package: String,
        versions: Vec<String>,
    },

    // 40-49
    #[error("{unit} `{command}` returned {code} {stderr}")]
    ProcessIdsFailed {
        unit: String,
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{unit} `{command}` returned {code} (fail)")]
    CommandFailed {
        unit: String,
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("action {action} on {unit} failed: {message}")]
    ActionFailed {
        unit: String,
        action: String,
        message: String,
    },

    #[error("port check failed: {0}")]
    PortCheckFailed(String),

    // 50-59
    #[error("orchestration client error: {0}")]
    Client(String),

    #[error("timed out after {seconds}s waiting for {what}")]
    Timeout { what: String, seconds: u64 },

    // 60-69
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Numeric code; the tens digit follows [`ErrorCategory`]
    /// (1 config, 3 validation, 4 remote, 5 client, 6 io).
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidArgument(_) => 11,
            Error::NetworkConfigNotFound { .. } => 12,
            Error::TopologyNotFound { .. } => 13,
            Error::UnitCountMismatch { .. } => 30,
            Error::UnitNotFound { .. } => 31,
            Error::ProcessNameCountMismatch { .. } => 32,
            Error::ProcessNameMismatch { .. } => 33,
            Error::PidCountMismatch { .. } => 34,
            Error::UbuntuReleaseNotFound { .. } => 35,
            Error::PackageVersionMismatch { .. } => 36,
            Error::ProcessIdsFailed { .. } => 40,
            Error::CommandFailed { .. } => 41,
            Error::ActionFailed { .. } => 42,
            Error::PortCheckFailed(_) => 43,
            Error::Client(_) => 50,
            Error::Timeout { .. } => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Yaml(_) => 62,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidArgument(_)
            | Error::NetworkConfigNotFound { .. }
            | Error::TopologyNotFound { .. } => ErrorCategory::Config,

            Error::UnitCountMismatch { .. }
            | Error::UnitNotFound { .. }
            | Error::ProcessNameCountMismatch { .. }
            | Error::ProcessNameMismatch { .. }
            | Error::PidCountMismatch { .. }
            | Error::UbuntuReleaseNotFound { .. }
            | Error::PackageVersionMismatch { .. } => ErrorCategory::Validation,

            Error::ProcessIdsFailed { .. }
            | Error::CommandFailed { .. }
            | Error::ActionFailed { .. }
            | Error::PortCheckFailed(_) => ErrorCategory::Remote,

            Error::Client(_) | Error::Timeout { .. } => ErrorCategory::Client,

            Error::Io(_) | Error::Json(_) | Error::Yaml(_) => ErrorCategory::Io,
        }
    }

    /// Title line used by [`format_error_human`].
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Invalid Configuration",
            Error::InvalidArgument(_) => "Invalid Argument",
            Error::NetworkConfigNotFound { .. } => "Network Config Not Found",
            Error::TopologyNotFound { .. } => "Network Topology Not Found",

            Error::UnitCountMismatch { .. } => "Unit Count Mismatch",
            Error::UnitNotFound { .. } => "Unit Not Found",
            Error::ProcessNameCountMismatch { .. } => "Process Name Count Mismatch",
            Error::ProcessNameMismatch { .. } => "Process Name Mismatch",
            Error::PidCountMismatch { .. } => "PID Count Mismatch",
            Error::UbuntuReleaseNotFound { .. } => "Ubuntu Release Not Found",
            Error::PackageVersionMismatch { .. } => "Package Version Mismatch",

            Error::ProcessIdsFailed { .. } => "Process ID Lookup Failed",
            Error::CommandFailed { .. } => "Remote Command Failed",
            Error::ActionFailed { .. } => "Action Failed",
            Error::PortCheckFailed(_) => "Port Check Failed",

            Error::Client(_) => "Orchestration Client Error",
            Error::Timeout { .. } => "Timeout",

            Error::Io(_) => "File Access Failed",
            Error::Json(_) => "Malformed JSON",
            Error::Yaml(_) => "Malformed YAML",
        }
    }
}

/// JSON view of an [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,

    pub category: ErrorCategory,

    pub message: String,

    /// Offending unit, process, command and counts, where known.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnitCountMismatch { expected, actual }
            | Error::ProcessNameCountMismatch {
                expected, actual, ..
            } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::PidCountMismatch {
                unit,
                process,
                expected,
                actual,
            } => {
                context.insert("unit".to_string(), serde_json::json!(unit));
                context.insert("process".to_string(), serde_json::json!(process));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::ProcessIdsFailed {
                unit,
                command,
                code,
                ..
            }
            | Error::CommandFailed {
                unit,
                command,
                code,
                ..
            } => {
                context.insert("unit".to_string(), serde_json::json!(unit));
                context.insert("command".to_string(), serde_json::json!(command));
                context.insert("exit_code".to_string(), serde_json::json!(code));
            }
            Error::UnitNotFound { unit } | Error::ProcessNameMismatch { unit, .. } => {
                context.insert("unit".to_string(), serde_json::json!(unit));
            }
            Error::Timeout { what, seconds } => {
                context.insert("waiting_for".to_string(), serde_json::json!(what));
                context.insert("seconds".to_string(), serde_json::json!(seconds));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Attach one more context entry; values that fail to serialize are dropped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.context.insert(key.into(), value);
        }
        self
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(_) => format!(r#"{{"code":{},"category":"{}"}}"#, self.code, self.category),
        }
    }
}

/// Two-line rendering for a terminal: headline, then the full message.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, reset) = if use_color {
        ("\x1b[31m", "\x1b[0m")
    } else {
        ("", "")
    };

    format!("{red}error{reset}: {}\n  {}", err.headline(), err)
}
