//! Logging configuration.
//!
//! Read from `STACKCHECK_LOG` (level, falling back to `RUST_LOG`) and
//! `STACKCHECK_LOG_FORMAT`, with explicit overrides from the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable selecting the log level.
pub const ENV_LOG_LEVEL: &str = "STACKCHECK_LOG";

/// Environment variable selecting the log format.
pub const ENV_LOG_FORMAT: &str = "STACKCHECK_LOG_FORMAT";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

const FORMAT_NAMES: &[(&str, LogFormat)] = &[
    ("human", LogFormat::Human),
    ("pretty", LogFormat::Human),
    ("jsonl", LogFormat::Jsonl),
    ("json", LogFormat::Jsonl),
];

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

/// Verbosity threshold, mapped onto `EnvFilter` directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

const LEVEL_NAMES: &[(&str, LogLevel)] = &[
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("error", LogLevel::Error),
    ("off", LogLevel::Off),
    ("quiet", LogLevel::Off),
];

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

fn lookup_name<T: Copy>(table: &[(&str, T)], kind: &str, s: &str) -> Result<T, String> {
    let wanted = s.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| format!("unrecognized log {} '{}'", kind, s))
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(FORMAT_NAMES, "format", s)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_name(LEVEL_NAMES, "level", s)
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved settings for [`init_logging`](super::init_logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Prefix human-format lines with a timestamp.
    pub timestamps: bool,
    /// Raw `RUST_LOG` directives, kept only when no level was chosen
    /// explicitly or through `STACKCHECK_LOG`.
    pub rust_log: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            timestamps: true,
            rust_log: None,
        }
    }
}

impl LogConfig {
    /// Create config from the process environment and caller overrides.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), level, format)
    }

    /// Create config reading variables through `lookup`.
    ///
    /// Unparsable values are ignored; overrides take final precedence.
    pub fn from_lookup<F>(lookup: F, level: Option<LogLevel>, format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let chosen = level.or_else(|| lookup(ENV_LOG_LEVEL).and_then(|val| val.parse().ok()));
        let rust_log = match chosen {
            Some(_) => None,
            None => lookup("RUST_LOG").filter(|val| !val.trim().is_empty()),
        };
        let env_format = lookup(ENV_LOG_FORMAT).and_then(|val| val.parse().ok());

        Self {
            level: chosen
                .or_else(|| rust_log.as_deref().and_then(most_verbose_level))
                .unwrap_or_default(),
            format: format.or(env_format).unwrap_or_default(),
            rust_log,
            ..Self::default()
        }
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        Self {
            level,
            rust_log: None,
            ..self
        }
    }

    pub fn with_timestamps(self, timestamps: bool) -> Self {
        Self { timestamps, ..self }
    }

    /// `EnvFilter` directive for the workspace crates at `level`.
    pub fn level_directive(&self) -> String {
        format!("sc_core={level},sc_config={level}", level = self.level)
    }

    /// Directive to install: passed-through `RUST_LOG`, else [`Self::level_directive`].
    pub fn filter_directive(&self) -> String {
        self.rust_log.clone().unwrap_or_else(|| self.level_directive())
    }
}

/// Most verbose level named anywhere in a `RUST_LOG` directive string.
fn most_verbose_level(directives: &str) -> Option<LogLevel> {
    directives
        .split(|c: char| c == ',' || c == '=')
        .filter_map(|part| part.parse::<LogLevel>().ok())
        .min()
}
