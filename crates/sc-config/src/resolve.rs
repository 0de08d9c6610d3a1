//! Locating configuration files.
//!
//! Candidates are tried in order: the caller's explicit path, a per-file
//! environment variable, `STACKCHECK_CONFIG_DIR`, the working directory, the
//! user config directory, then `/etc/stackcheck`. The first existing file wins.

use std::path::{Path, PathBuf};

/// Which candidate a resolved file came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit,
    /// Either the per-file variable or `STACKCHECK_CONFIG_DIR`.
    Environment,
    WorkingDirectory,
    /// `$XDG_CONFIG_HOME/stackcheck` or the platform equivalent.
    XdgConfig,
    SystemConfig,
    #[default]
    NotFound,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Explicit => "explicit",
            ConfigSource::Environment => "env",
            ConfigSource::WorkingDirectory => "cwd",
            ConfigSource::XdgConfig => "user config dir",
            ConfigSource::SystemConfig => "/etc",
            ConfigSource::NotFound => "none",
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Directory holding every stackcheck config file.
pub const ENV_CONFIG_DIR: &str = "STACKCHECK_CONFIG_DIR";

/// Direct path to the network topology file.
pub const ENV_NETWORK_CONFIG: &str = "STACKCHECK_NETWORK_CONFIG";

/// Direct path to the upgrade settings file.
pub const ENV_UPGRADE_CONFIG: &str = "STACKCHECK_UPGRADE_CONFIG";

pub const NETWORK_FILENAME: &str = "network.yaml";
pub const UPGRADE_FILENAME: &str = "upgrade.yaml";

const CONFIG_SUBDIR: &str = "stackcheck";

/// Ordered candidate paths for `filename`, existing or not.
pub fn candidate_paths(
    explicit: Option<&Path>,
    env_var: &str,
    filename: &str,
) -> Vec<(PathBuf, ConfigSource)> {
    let mut candidates = Vec::with_capacity(6);
    if let Some(path) = explicit {
        candidates.push((path.to_path_buf(), ConfigSource::Explicit));
    }
    if let Some(path) = std::env::var_os(env_var) {
        candidates.push((PathBuf::from(path), ConfigSource::Environment));
    }
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        candidates.push((Path::new(&dir).join(filename), ConfigSource::Environment));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push((cwd.join(filename), ConfigSource::WorkingDirectory));
    }
    if let Some(dir) = user_config_dir() {
        candidates.push((dir.join(filename), ConfigSource::XdgConfig));
    }
    candidates.push((system_config_dir().join(filename), ConfigSource::SystemConfig));
    candidates
}

/// First existing candidate for `filename`, if any.
pub fn resolve_config_file(
    explicit: Option<&Path>,
    env_var: &str,
    filename: &str,
) -> Option<ResolvedPath> {
    let (path, source) = candidate_paths(explicit, env_var, filename)
        .into_iter()
        .find(|(path, _)| path.is_file())?;
    tracing::debug!(path = %path.display(), %source, "config file located");
    Some(ResolvedPath { path, source })
}

pub fn user_config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(CONFIG_SUBDIR))
}

pub fn system_config_dir() -> PathBuf {
    Path::new("/etc").join(CONFIG_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_end_with_system_dir() {
        let candidates = candidate_paths(
            Some(Path::new("/tmp/mine.yaml")),
            "STACKCHECK_TEST_UNSET_VAR",
            "mine.yaml",
        );
        assert_eq!(
            candidates.first(),
            Some(&(PathBuf::from("/tmp/mine.yaml"), ConfigSource::Explicit))
        );
        assert_eq!(
            candidates.last(),
            Some(&(
                PathBuf::from("/etc/stackcheck/mine.yaml"),
                ConfigSource::SystemConfig
            ))
        );
    }

    #[test]
    fn explicit_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "x: 1\n").unwrap();

        let resolved =
            resolve_config_file(Some(&path), "STACKCHECK_TEST_UNSET_VAR", "custom.yaml").unwrap();
        assert_eq!(resolved.path, path);
        assert_eq!(resolved.source, ConfigSource::Explicit);
        assert_eq!(resolved.source.to_string(), "explicit");
    }

    #[test]
    fn absent_everywhere_is_none() {
        let resolved = resolve_config_file(
            Some(Path::new("/nonexistent/stackcheck/none.yaml")),
            "STACKCHECK_TEST_UNSET_VAR",
            "stackcheck-test-file-that-does-not-exist.yaml",
        );
        assert!(resolved.is_none());
    }
}
