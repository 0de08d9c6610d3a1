//! Upgrade run settings.
//!
//! Loaded from `upgrade.yaml`:
//!
//! ```yaml
//! series:
//!   from_series: xenial
//!   to_series: bionic
//!   origin: openstack-origin
//!   files: [/tmp/workaround.sh]
//!   workaround_script: /tmp/workaround.sh
//! poll:
//!   timeout_secs: 2700
//! extra_filters: [easyrsa, etcd]
//! ```

use crate::resolve::{resolve_config_file, ENV_UPGRADE_CONFIG, UPGRADE_FILENAME};
use crate::yaml::get_yaml_config;
use sc_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level upgrade configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub series: SeriesUpgradeSettings,
    pub poll: PollSettings,
    /// Named filters appended to the planner's default chain.
    pub extra_filters: Vec<String>,
}

impl UpgradeConfig {
    /// Load from an explicit path or the resolved `upgrade.yaml`.
    ///
    /// Falls back to defaults when no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match resolve_config_file(path, ENV_UPGRADE_CONFIG, UPGRADE_FILENAME) {
            Some(resolved) => {
                tracing::debug!(
                    path = %resolved.path.display(),
                    source = %resolved.source,
                    "loading upgrade config"
                );
                get_yaml_config(&resolved.path)
            }
            None => Ok(UpgradeConfig::default()),
        }
    }
}

/// Options for a rolling series upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesUpgradeSettings {
    pub from_series: String,
    pub to_series: String,
    /// Config option to reset to the distro pocket after upgrade
    /// (`openstack-origin` or `source`); `None` for charms with neither.
    pub origin: Option<String>,
    pub pause_non_leader_primary: bool,
    pub pause_non_leader_subordinate: bool,
    /// Files copied to each unit before `do-release-upgrade`.
    pub files: Vec<PathBuf>,
    /// Script run on each unit before `do-release-upgrade`.
    pub workaround_script: Option<String>,
}

impl Default for SeriesUpgradeSettings {
    fn default() -> Self {
        SeriesUpgradeSettings {
            from_series: "trusty".to_string(),
            to_series: "xenial".to_string(),
            origin: Some("openstack-origin".to_string()),
            pause_non_leader_primary: true,
            pause_non_leader_subordinate: true,
            files: Vec::new(),
            workaround_script: None,
        }
    }
}

impl SeriesUpgradeSettings {
    pub fn with_series(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from_series = from.into();
        self.to_series = to.into();
        self
    }

    pub fn with_origin(mut self, origin: Option<&str>) -> Self {
        self.origin = origin.map(str::to_string);
        self
    }

    pub fn with_pausing(mut self, primary: bool, subordinate: bool) -> Self {
        self.pause_non_leader_primary = primary;
        self.pause_non_leader_subordinate = subordinate;
        self
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn with_workaround_script(mut self, script: impl Into<String>) -> Self {
        self.workaround_script = Some(script.into());
        self
    }
}

/// Bounds on status polling while waiting for the model to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub timeout_secs: u64,
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            timeout_secs: 2700,
            interval_secs: 10,
        }
    }
}

impl PollSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
